//! Eligibility filter: which posts may be shown and voted on.
//!
//! When low-score hiding is enabled, only posts strictly above the threshold
//! survive. A post sitting exactly on the threshold is hidden.
//!
//! The feed and the bulk-vote target computation both go through
//! [`is_visible`], so the two can never disagree.

use crate::ledger::{is_judged, LocalVoteMap};
use crate::post::{Post, PostId};

/// Default hide threshold (exclusive).
pub const DOWNVOTE_THRESHOLD: i64 = -5;

/// Visibility policy for low-scoring posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visibility {
    /// Hide posts at or below `threshold`
    pub hide_low_score: bool,
    /// Exclusive lower bound for visible posts
    pub threshold: i64,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            hide_low_score: false,
            threshold: DOWNVOTE_THRESHOLD,
        }
    }
}

impl Visibility {
    /// Policy that hides posts at or below the default threshold.
    pub fn hiding_low_scores() -> Self {
        Self {
            hide_low_score: true,
            ..Self::default()
        }
    }

    /// Whether `post` passes this policy.
    pub fn allows(&self, post: &Post) -> bool {
        is_visible(post, self.hide_low_score, self.threshold)
    }
}

/// Single visibility predicate shared by every call site.
pub fn is_visible(post: &Post, hide_low_score: bool, threshold: i64) -> bool {
    !hide_low_score || post.vote_count > threshold
}

/// Keep only the posts visible under the given policy.
pub fn filter_by_threshold(posts: &[Post], hide_low_score: bool, threshold: i64) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| is_visible(post, hide_low_score, threshold))
        .cloned()
        .collect()
}

/// Posts a bulk vote would act on: visible, not yet judged, not authored by
/// the voter. Order follows `posts`.
pub fn bulk_vote_targets(
    posts: &[Post],
    local_votes: &LocalVoteMap,
    voter_id: Option<&str>,
    visibility: Visibility,
) -> Vec<PostId> {
    posts
        .iter()
        .filter(|post| visibility.allows(post))
        .filter(|post| !is_judged(post, local_votes, voter_id))
        .filter(|post| !voter_id.is_some_and(|voter| post.is_authored_by(voter)))
        .map(|post| post.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use proptest::prelude::*;

    #[test]
    fn threshold_is_exclusive() {
        let at = [Post::new("p").with_votes(-5)];
        let above = [Post::new("p").with_votes(-4)];

        assert!(filter_by_threshold(&at, true, -5).is_empty());
        assert_eq!(filter_by_threshold(&above, true, -5).len(), 1);
    }

    #[test]
    fn disabled_filter_is_identity() {
        let posts = vec![
            Post::new("a").with_votes(-100),
            Post::new("b").with_votes(3),
        ];
        assert_eq!(filter_by_threshold(&posts, false, DOWNVOTE_THRESHOLD), posts);
    }

    #[test]
    fn bulk_targets_skip_voted_own_and_hidden() {
        let posts = vec![
            Post::new("p1").with_votes(2),
            Post::new("p2").with_author("me"),
            Post::new("p3").with_votes(-5),
            Post::new("p4").with_voter("me", Direction::Down),
            Post::new("p5"),
        ];
        let votes: LocalVoteMap = [("p1".to_string(), Direction::Up)].into();

        let open = bulk_vote_targets(&posts, &votes, Some("me"), Visibility::default());
        assert_eq!(open, vec!["p3".to_string(), "p5".to_string()]);

        let hiding = bulk_vote_targets(&posts, &votes, Some("me"), Visibility::hiding_low_scores());
        assert_eq!(hiding, vec!["p5".to_string()]);
    }

    proptest! {
        #[test]
        fn filtered_posts_are_above_threshold(
            counts in proptest::collection::vec(-20i64..20, 0..16),
            threshold in -10i64..10,
        ) {
            let posts: Vec<Post> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| Post::new(i.to_string()).with_votes(*c))
                .collect();
            let kept = filter_by_threshold(&posts, true, threshold);

            prop_assert!(kept.iter().all(|p| p.vote_count > threshold));
            prop_assert_eq!(
                kept.len(),
                counts.iter().filter(|c| **c > threshold).count()
            );
        }
    }
}
