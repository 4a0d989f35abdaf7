//! Queue selection: which post(s) to present next.
//!
//! Two strategies share the same two-phase search over the sorted collection:
//!
//! 1. First post that is not on screen, not shown this cycle and not voted.
//! 2. If phase one finds nothing but an unvoted post still exists, search
//!    again ignoring the shown set. This is the cycle reset.
//!
//! When neither phase finds a post the collection is exhausted for this
//! voter, which the cooldown controller picks up.
//!
//! # Grid vs focus
//!
//! - Grid mode ([`next_unvoted_post`]) resets the cycle implicitly. Callers
//!   detect the reset by checking whether the returned post is already in
//!   their shown set.
//! - Focus mode ([`next_swipe_post`]) additionally skips the current post and
//!   the voter's own posts, and reports the reset through
//!   [`SwipePick::should_reset_shown`]. Callers clear the shown set only then,
//!   so history phase one could still use is not erased early.

use crate::ledger::LocalVoteMap;
use crate::post::{Post, PostId};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Number of slots in grid mode.
pub const VISIBLE_COUNT: usize = 4;

/// Posts offered during the current exhaustion cycle.
pub type ShownSet = HashSet<PostId>;

/// Order in which the feed is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SortOrder {
    /// Highest count first, newest first among equals
    #[default]
    Top,
    /// Newest first
    New,
}

/// Sort a snapshot of posts for traversal. Ties fall back to the id so the
/// order is deterministic; posts without a timestamp sort last.
pub fn sort_posts(posts: &[Post], order: SortOrder) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    match order {
        SortOrder::Top => sorted.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then_with(|| Reverse(a.created_at).cmp(&Reverse(b.created_at)))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::New => sorted.sort_by(|a, b| {
            Reverse(a.created_at)
                .cmp(&Reverse(b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
    sorted
}

/// Animation state of a grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum AnimState {
    /// Shown and actionable
    Visible,
    /// Voted, about to leave
    Voted,
    /// Leaving the grid
    FadingOut,
    /// Entering the grid
    FadingIn,
}

/// One grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    /// Post displayed in this slot
    pub post_id: PostId,
    /// Current animation state
    pub anim_state: AnimState,
}

impl Slot {
    /// A settled slot.
    pub fn visible(post_id: impl Into<PostId>) -> Self {
        Self {
            post_id: post_id.into(),
            anim_state: AnimState::Visible,
        }
    }
}

/// Ids currently on screen in grid mode.
pub fn visible_ids(slots: &[Slot]) -> Vec<&str> {
    slots.iter().map(|slot| slot.post_id.as_str()).collect()
}

/// Grid mode: next post to fill a freed slot.
///
/// Returns `None` only when no unvoted post exists outside the visible slots.
pub fn next_unvoted_post<'a>(
    sorted_posts: &'a [Post],
    visible_ids: &[&str],
    shown_ids: &ShownSet,
    votes: &LocalVoteMap,
) -> Option<&'a Post> {
    let candidate = |post: &&Post| {
        !visible_ids.contains(&post.id.as_str()) && !votes.contains_key(&post.id)
    };

    if let Some(post) = sorted_posts
        .iter()
        .filter(candidate)
        .find(|post| !shown_ids.contains(&post.id))
    {
        return Some(post);
    }

    // Cycle reset: every unvoted post has been offered once already
    sorted_posts.iter().find(candidate)
}

/// Result of a focus-mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipePick<'a> {
    /// Post to present next, `None` when exhausted
    pub next_post: Option<&'a Post>,
    /// The pick relied on a cycle reset; clear the shown set
    pub should_reset_shown: bool,
}

impl SwipePick<'_> {
    /// Whether the voter has run out of posts.
    pub fn is_exhausted(&self) -> bool {
        self.next_post.is_none()
    }
}

/// Focus mode: next single post to present.
///
/// Skips the current post and anything authored by `voter_id`.
pub fn next_swipe_post<'a>(
    sorted_posts: &'a [Post],
    current_post_id: Option<&str>,
    shown_ids: &ShownSet,
    votes: &LocalVoteMap,
    voter_id: Option<&str>,
) -> SwipePick<'a> {
    let candidate = |post: &&Post| {
        current_post_id != Some(post.id.as_str())
            && !voter_id.is_some_and(|voter| post.is_authored_by(voter))
            && !votes.contains_key(&post.id)
    };

    if let Some(post) = sorted_posts
        .iter()
        .filter(candidate)
        .find(|post| !shown_ids.contains(&post.id))
    {
        return SwipePick {
            next_post: Some(post),
            should_reset_shown: false,
        };
    }

    match sorted_posts.iter().find(candidate) {
        Some(post) => SwipePick {
            next_post: Some(post),
            should_reset_shown: true,
        },
        None => SwipePick {
            next_post: None,
            should_reset_shown: false,
        },
    }
}

/// Populate the grid from scratch.
///
/// Unvoted posts come first in sorted order. If there are fewer than `count`
/// of them the remaining slots take voted posts, so the grid is only short
/// when the collection itself is.
pub fn initial_slots(sorted_posts: &[Post], votes: &LocalVoteMap, count: usize) -> Vec<Slot> {
    let (unvoted, voted): (Vec<&Post>, Vec<&Post>) = sorted_posts
        .iter()
        .partition(|post| !votes.contains_key(&post.id));

    unvoted
        .into_iter()
        .chain(voted)
        .take(count)
        .map(|post| Slot::visible(post.id.clone()))
        .collect()
}

/// Whether no slot holds a post the voter can still act on.
pub fn grid_exhausted(slots: &[Slot], votes: &LocalVoteMap) -> bool {
    slots.iter().all(|slot| votes.contains_key(&slot.post_id))
}

/// Set the animation state of the slot showing `post_id`.
pub fn set_anim_state(slots: &[Slot], post_id: &str, state: AnimState) -> Vec<Slot> {
    slots
        .iter()
        .map(|slot| {
            if slot.post_id == post_id {
                Slot {
                    post_id: slot.post_id.clone(),
                    anim_state: state,
                }
            } else {
                slot.clone()
            }
        })
        .collect()
}

/// Swap the slot showing `post_id` for `next`, fading it in. With no
/// replacement the slot is dropped and the grid shrinks.
pub fn replace_slot(slots: &[Slot], post_id: &str, next: Option<&Post>) -> Vec<Slot> {
    slots
        .iter()
        .filter_map(|slot| {
            if slot.post_id != post_id {
                return Some(slot.clone());
            }
            next.map(|post| Slot {
                post_id: post.id.clone(),
                anim_state: AnimState::FadingIn,
            })
        })
        .collect()
}

/// Finish entry animations.
pub fn settle(slots: &[Slot]) -> Vec<Slot> {
    slots
        .iter()
        .map(|slot| match slot.anim_state {
            AnimState::FadingIn => Slot::visible(slot.post_id.clone()),
            _ => slot.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn feed(n: usize) -> Vec<Post> {
        (1..=n).map(|i| Post::new(format!("p{}", i))).collect()
    }

    fn voted(ids: &[&str]) -> LocalVoteMap {
        ids.iter().map(|id| (id.to_string(), Direction::Up)).collect()
    }

    fn shown(ids: &[&str]) -> ShownSet {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn grid_prefers_unshown_unvoted() {
        let posts = feed(6);
        let next = next_unvoted_post(&posts, &["p1", "p2"], &shown(&["p3"]), &voted(&["p4"]));
        assert_eq!(next.map(|p| p.id.as_str()), Some("p5"));
    }

    #[test]
    fn grid_cycle_reset_ignores_shown() {
        let posts = feed(4);
        let shown = shown(&["p3", "p4"]);
        let next = next_unvoted_post(&posts, &["p1", "p2"], &shown, &LocalVoteMap::new());

        let next = next.expect("unvoted post remains");
        assert_eq!(next.id, "p3");
        // Caller detects the implicit reset
        assert!(shown.contains(&next.id));
    }

    #[test]
    fn grid_exhaustion_is_none() {
        let posts = feed(5);
        let next = next_unvoted_post(&posts, &["p1"], &ShownSet::new(), &voted(&["p2", "p3", "p4", "p5"]));
        assert!(next.is_none());
    }

    #[test]
    fn swipe_skips_current_and_own() {
        let posts = vec![
            Post::new("p1"),
            Post::new("p2").with_author("me"),
            Post::new("p3"),
        ];
        let pick = next_swipe_post(&posts, Some("p1"), &ShownSet::new(), &LocalVoteMap::new(), Some("me"));
        assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p3"));
        assert!(!pick.should_reset_shown);
    }

    #[test]
    fn swipe_reports_cycle_reset() {
        let posts = feed(3);
        let pick = next_swipe_post(
            &posts,
            Some("p3"),
            &shown(&["p1", "p2", "p3"]),
            &LocalVoteMap::new(),
            Some("me"),
        );
        assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p1"));
        assert!(pick.should_reset_shown);
    }

    #[test]
    fn swipe_only_own_posts_left_is_exhausted() {
        let posts = vec![Post::new("p1").with_author("me"), Post::new("p2")];
        let pick = next_swipe_post(&posts, None, &ShownSet::new(), &voted(&["p2"]), Some("me"));
        assert!(pick.is_exhausted());
        assert!(!pick.should_reset_shown);
    }

    #[test]
    fn swipe_current_is_never_repeated() {
        let posts = feed(1);
        let pick = next_swipe_post(&posts, Some("p1"), &ShownSet::new(), &LocalVoteMap::new(), None);
        assert!(pick.is_exhausted());
    }

    #[test]
    fn initial_slots_backfill_with_voted() {
        let posts = feed(5);
        let slots = initial_slots(&posts, &voted(&["p1", "p2", "p3"]), VISIBLE_COUNT);
        let ids: Vec<&str> = visible_ids(&slots);
        assert_eq!(ids, vec!["p4", "p5", "p1", "p2"]);
        assert!(slots.iter().all(|s| s.anim_state == AnimState::Visible));
    }

    #[test]
    fn initial_slots_short_collection() {
        let slots = initial_slots(&feed(2), &LocalVoteMap::new(), VISIBLE_COUNT);
        assert_eq!(slots.len(), 2);
        assert!(initial_slots(&[], &LocalVoteMap::new(), VISIBLE_COUNT).is_empty());
    }

    #[test]
    fn slot_lifecycle() {
        let posts = feed(5);
        let slots = initial_slots(&posts, &LocalVoteMap::new(), VISIBLE_COUNT);

        let slots = set_anim_state(&slots, "p2", AnimState::Voted);
        assert_eq!(slots[1].anim_state, AnimState::Voted);

        let slots = set_anim_state(&slots, "p2", AnimState::FadingOut);
        let slots = replace_slot(&slots, "p2", posts.get(4));
        assert_eq!(slots[1], Slot { post_id: "p5".into(), anim_state: AnimState::FadingIn });

        let slots = settle(&slots);
        assert!(slots.iter().all(|s| s.anim_state == AnimState::Visible));

        let shrunk = replace_slot(&slots, "p1", None);
        assert_eq!(visible_ids(&shrunk), vec!["p5", "p3", "p4"]);
    }

    #[test]
    fn grid_exhausted_when_every_slot_voted() {
        let slots = initial_slots(&feed(2), &LocalVoteMap::new(), VISIBLE_COUNT);
        assert!(!grid_exhausted(&slots, &voted(&["p1"])));
        assert!(grid_exhausted(&slots, &voted(&["p1", "p2"])));
        assert!(grid_exhausted(&[], &LocalVoteMap::new()));
    }

    #[test]
    fn sort_orders() {
        let posts = vec![
            Post::new("a").with_votes(1).created_at(10),
            Post::new("b").with_votes(5).created_at(5),
            Post::new("c").with_votes(1).created_at(20),
            Post::new("d").with_votes(1),
        ];

        let top: Vec<String> = sort_posts(&posts, SortOrder::Top).into_iter().map(|p| p.id).collect();
        assert_eq!(top, vec!["b", "c", "a", "d"]);

        let new: Vec<String> = sort_posts(&posts, SortOrder::New).into_iter().map(|p| p.id).collect();
        assert_eq!(new, vec!["c", "a", "b", "d"]);
    }
}
