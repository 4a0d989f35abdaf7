//! End-to-end selection scenarios across selector, ledger and cooldown.

use crate::*;

fn three_posts() -> Vec<Post> {
    vec![Post::new("p1"), Post::new("p2"), Post::new("p3")]
}

fn voted(ids: &[&str]) -> LocalVoteMap {
    ids.iter().map(|id| (id.to_string(), Direction::Up)).collect()
}

#[test]
fn fresh_voter_gets_first_post() {
    let posts = three_posts();
    let pick = next_swipe_post(&posts, None, &ShownSet::new(), &LocalVoteMap::new(), Some("me"));

    assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p1"));
    assert!(!pick.should_reset_shown);
}

#[test]
fn voted_posts_are_skipped() {
    let posts = three_posts();
    let pick = next_swipe_post(&posts, None, &ShownSet::new(), &voted(&["p1", "p2"]), Some("me"));

    assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p3"));
}

#[test]
fn all_voted_leads_to_exhaustion() {
    let posts = three_posts();
    let pick = next_swipe_post(&posts, None, &ShownSet::new(), &voted(&["p1", "p2", "p3"]), Some("me"));

    assert_eq!(
        pick,
        SwipePick {
            next_post: None,
            should_reset_shown: false
        }
    );

    let state = CooldownState::default().initialize();
    let phase = state.evaluate(&ExhaustionCheck {
        selection_empty: pick.is_exhausted(),
        post_count: posts.len(),
        limit_reached: false,
    });
    assert_eq!(phase, CooldownPhase::Exhausted);
}

#[test]
fn failed_downvote_is_reverted() {
    let posts = vec![Post::new("p1").with_votes(10)];
    let votes = LocalVoteMap::new();

    let pending = PendingVote::new("p1", &votes, Direction::Down);
    let (optimistic, optimistic_votes) = pending.apply(&posts, &votes);
    assert_eq!(optimistic[0].vote_count, 9);
    assert_eq!(optimistic_votes.get("p1"), Some(&Direction::Down));

    let reverted = pending.revert(&optimistic, &optimistic_votes);
    assert_eq!(reverted.posts[0].vote_count, 10);
    assert!(!reverted.votes.contains_key("p1"));
}

#[test]
fn bulk_targets_exclude_voted_and_own() {
    let posts = vec![
        Post::new("p1"),
        Post::new("p2").with_author("me"),
        Post::new("p3"),
        Post::new("p4"),
    ];
    let votes = voted(&["p1"]);

    let targets = bulk_vote_targets(&posts, &votes, Some("me"), Visibility::default());
    assert_eq!(targets, vec!["p3".to_string(), "p4".to_string()]);
}

#[test]
fn revert_after_moving_on_targets_original_post() {
    let posts = three_posts();
    let votes = LocalVoteMap::new();

    let first = PendingVote::new("p1", &votes, Direction::Up);
    let (posts_a, votes_a) = first.apply(&posts, &votes);

    // Voter advances and votes on p2 before p1's submission fails
    let second = PendingVote::new("p2", &votes_a, Direction::Up);
    let (posts_b, votes_b) = second.apply(&posts_a, &votes_a);

    let reverted = first.revert(&posts_b, &votes_b);
    assert_eq!(reverted.posts[0].vote_count, 0);
    assert_eq!(reverted.posts[1].vote_count, 1);
    assert!(!reverted.votes.contains_key("p1"));
    assert_eq!(reverted.votes.get("p2"), Some(&Direction::Up));
}

#[test]
fn progress_survives_local_reset() {
    let posts = vec![
        Post::new("p1").with_voter("me", Direction::Up),
        Post::new("p2").with_voter("me", Direction::Down),
        Post::new("p3"),
    ];

    // Local cache wiped by cooldown expiry; server still knows
    assert_eq!(voted_count(&posts, &LocalVoteMap::new(), Some("me")), 2);

    // Selector works off the local map, so the posts are votable again
    let pick = next_swipe_post(&posts, None, &ShownSet::new(), &LocalVoteMap::new(), Some("me"));
    assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p1"));
}
