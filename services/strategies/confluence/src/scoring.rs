//! Confluence scoring: fuse five directional votes into one result.

use chrono::{DateTime, Utc};

use crate::signals::{ConfluenceResult, Vote, VoteSet};
use types::Direction;

/// Each ready, non-neutral voter contributes this many points to its side.
pub const VOTE_WEIGHT: u8 = 20;

/// Score a vote set into a [`ConfluenceResult`].
///
/// Long and short votes add [`VOTE_WEIGHT`] to their respective sides;
/// neutral or warming voters add nothing to either. The total is the larger
/// side, the dominant direction is that side's direction, and a tie asserts
/// no direction at all. Pure: identical votes always produce identical
/// results.
pub fn score_votes(symbol: &str, timestamp: DateTime<Utc>, votes: VoteSet) -> ConfluenceResult {
    let mut long_votes = 0u8;
    let mut short_votes = 0u8;
    for vote in votes.as_array() {
        match vote {
            Vote::Long => long_votes += 1,
            Vote::Short => short_votes += 1,
            Vote::Neutral => {}
        }
    }

    let long_score = long_votes * VOTE_WEIGHT;
    let short_score = short_votes * VOTE_WEIGHT;
    let (dominant_direction, aligned_count) = match long_score.cmp(&short_score) {
        std::cmp::Ordering::Greater => (Some(Direction::Long), long_votes),
        std::cmp::Ordering::Less => (Some(Direction::Short), short_votes),
        std::cmp::Ordering::Equal => (None, 0),
    };

    ConfluenceResult {
        symbol: symbol.to_string(),
        timestamp,
        votes,
        long_score,
        short_score,
        total_score: long_score.max(short_score),
        aligned_count,
        dominant_direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(
        trend: Vote,
        momentum: Vote,
        confirmation: Vote,
        open_interest: Vote,
        funding: Vote,
    ) -> VoteSet {
        VoteSet {
            trend,
            momentum,
            confirmation,
            open_interest,
            funding,
        }
    }

    fn score(votes: VoteSet) -> ConfluenceResult {
        score_votes("BTCUSDT", Utc::now(), votes)
    }

    #[test]
    fn test_unanimous_long_scores_hundred() {
        let result = score(votes(
            Vote::Long,
            Vote::Long,
            Vote::Long,
            Vote::Long,
            Vote::Long,
        ));
        assert_eq!(result.total_score, 100);
        assert_eq!(result.aligned_count, 5);
        assert_eq!(result.dominant_direction, Some(Direction::Long));
    }

    #[test]
    fn test_mixed_votes_score_both_sides() {
        let result = score(votes(
            Vote::Long,
            Vote::Long,
            Vote::Long,
            Vote::Short,
            Vote::Neutral,
        ));
        assert_eq!(result.long_score, 60);
        assert_eq!(result.short_score, 20);
        assert_eq!(result.total_score, 60);
        assert_eq!(result.aligned_count, 3);
        assert_eq!(result.dominant_direction, Some(Direction::Long));
    }

    #[test]
    fn test_tie_asserts_no_direction() {
        let result = score(votes(
            Vote::Long,
            Vote::Long,
            Vote::Short,
            Vote::Short,
            Vote::Neutral,
        ));
        assert_eq!(result.total_score, 40);
        assert_eq!(result.dominant_direction, None);
        assert_eq!(result.aligned_count, 0);
    }

    #[test]
    fn test_all_neutral_scores_zero() {
        let result = score(votes(
            Vote::Neutral,
            Vote::Neutral,
            Vote::Neutral,
            Vote::Neutral,
            Vote::Neutral,
        ));
        assert_eq!(result.total_score, 0);
        assert_eq!(result.dominant_direction, None);
        assert_eq!(result.aligned_count, 0);
    }

    #[test]
    fn test_short_majority_dominates() {
        let result = score(votes(
            Vote::Short,
            Vote::Short,
            Vote::Short,
            Vote::Short,
            Vote::Long,
        ));
        assert_eq!(result.total_score, 80);
        assert_eq!(result.aligned_count, 4);
        assert_eq!(result.dominant_direction, Some(Direction::Short));
    }
}
