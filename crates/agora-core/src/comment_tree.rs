//! Comment tree assembly and cascading-delete planning.
//!
//! Everything here is a pure function over the comments already fetched for a
//! single post. Malformed input never fails: a comment whose parent is missing,
//! is itself, lives on another post, or sits on a parent cycle is promoted to
//! a root.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Comment, CommentId, Post, PostId, UserId};
use crate::error::DomainError;

/// Anything that can be placed in a comment tree.
pub trait Threaded {
    fn id(&self) -> CommentId;
    fn parent_id(&self) -> Option<CommentId>;
    fn post_id(&self) -> PostId;
    fn created_at(&self) -> DateTime<Utc>;
}

/// A comment together with its direct replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub replies: Vec<CommentNode<T>>,
}

impl<T> CommentNode<T> {
    /// Number of comments in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.replies.iter());
        }
        total
    }

    /// Length of the longest root-to-leaf path; a lone comment has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.replies.iter().map(|reply| (reply, depth + 1)));
        }
        deepest
    }
}

/// Total number of comments in a forest.
pub fn count_all<T>(forest: &[CommentNode<T>]) -> usize {
    forest.iter().map(CommentNode::count).sum()
}

/// Build the display forest for one post's comments.
///
/// Siblings (and roots) come out in ascending `created_at` order; ties keep
/// their input order. Every input comment appears exactly once.
pub fn build_tree<T: Threaded>(items: Vec<T>) -> Vec<CommentNode<T>> {
    build_tree_capped(items, usize::MAX)
}

/// [`build_tree`] with no path longer than `max_depth` comments.
///
/// Replies that would sit deeper are moved up to the last level, under their
/// ancestor one level above it, in `created_at` order alongside that
/// ancestor's direct replies. Two levels is the smallest cap applied.
pub fn build_tree_capped<T: Threaded>(mut items: Vec<T>, max_depth: usize) -> Vec<CommentNode<T>> {
    items.sort_by_key(|item| item.created_at());

    let mut parents = resolve_parents(&items);
    flatten_below(&mut parents, max_depth.max(2));
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(idx),
            None => roots.push(idx),
        }
    }

    // Breadth-first from the roots puts every parent before its replies, so
    // walking it backwards finishes each subtree before its parent needs it.
    let mut order = Vec::with_capacity(items.len());
    let mut queue: VecDeque<usize> = roots.iter().copied().collect();
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        queue.extend(children[idx].iter().copied());
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode<T>>> = (0..slots.len()).map(|_| None).collect();
    for &idx in order.iter().rev() {
        let replies = children[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(item) = slots[idx].take() {
            built[idx] = Some(CommentNode { item, replies });
        }
    }

    roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}

/// Number of comments on the path from a root down to `target`, both included.
///
/// Parents are resolved the way [`build_tree`] resolves them. Zero when
/// `target` is not in `all`.
pub fn thread_depth<T: Threaded>(all: &[T], target: CommentId) -> usize {
    let Some(start) = all.iter().position(|item| item.id() == target) else {
        return 0;
    };
    let parents = resolve_parents(all);
    let mut depth = 0;
    let mut cursor = Some(start);
    while let Some(idx) = cursor {
        depth += 1;
        cursor = parents[idx];
    }
    depth
}

/// Re-point every node deeper than `max_depth` at its ancestor one level up.
fn flatten_below(parents: &mut [Option<usize>], max_depth: usize) {
    let anchor_depth = max_depth - 1;
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); parents.len()];
    let mut queue = VecDeque::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(idx),
            None => queue.push_back(idx),
        }
    }

    let mut depth = vec![1; parents.len()];
    let mut anchor: Vec<usize> = (0..parents.len()).collect();
    while let Some(idx) = queue.pop_front() {
        for &child in &children[idx] {
            depth[child] = depth[idx] + 1;
            if depth[idx] >= anchor_depth {
                anchor[child] = anchor[idx];
                parents[child] = Some(anchor[idx]);
            }
            queue.push_back(child);
        }
    }
}

/// Index of each item's parent, or `None` when it must be treated as a root.
fn resolve_parents<T: Threaded>(items: &[T]) -> Vec<Option<usize>> {
    let index: HashMap<CommentId, usize> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.id(), idx))
        .collect();

    let mut parents: Vec<Option<usize>> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.parent_id()
                .filter(|parent_id| *parent_id != item.id())
                .and_then(|parent_id| index.get(&parent_id).copied())
                .filter(|&parent| parent != idx && items[parent].post_id() == item.post_id())
        })
        .collect();

    break_cycles(&mut parents);
    parents
}

/// Detach every node that lies on a parent cycle.
///
/// Each node has at most one parent, so following parent links from any node
/// either reaches a root or enters exactly one cycle.
fn break_cycles(parents: &mut [Option<usize>]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        let mut cursor = Some(start);
        while let Some(node) = cursor {
            if state[node] != UNSEEN {
                break;
            }
            state[node] = ON_PATH;
            path.push(node);
            cursor = parents[node];
        }

        if let Some(node) = cursor {
            if state[node] == ON_PATH {
                if let Some(pos) = path.iter().position(|&n| n == node) {
                    for &member in &path[pos..] {
                        parents[member] = None;
                    }
                }
            }
        }

        for node in path.drain(..) {
            state[node] = DONE;
        }
    }
}

/// The target comment plus every transitive reply to it.
///
/// Terminates on cyclic `parent_id` chains. If `target` is not among `all`,
/// the result is just `{target}`.
pub fn plan_cascading_delete<T: Threaded>(all: &[T], target: CommentId) -> HashSet<CommentId> {
    plan_cascading_delete_ordered(all, target)
        .into_iter()
        .collect()
}

/// Same set as [`plan_cascading_delete`], ordered leaves-first so that a store
/// without cascading foreign keys can remove the rows one by one.
pub fn plan_cascading_delete_ordered<T: Threaded>(all: &[T], target: CommentId) -> Vec<CommentId> {
    let post_of: HashMap<CommentId, PostId> =
        all.iter().map(|item| (item.id(), item.post_id())).collect();

    let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
    for item in all {
        if let Some(parent_id) = item.parent_id() {
            if parent_id != item.id() && post_of.get(&parent_id) == Some(&item.post_id()) {
                children.entry(parent_id).or_default().push(item.id());
            }
        }
    }

    let mut visited = HashSet::from([target]);
    let mut order = vec![target];
    let mut queue = VecDeque::from([target]);
    while let Some(id) = queue.pop_front() {
        let Some(replies) = children.get(&id) else {
            continue;
        };
        for &reply in replies {
            if visited.insert(reply) {
                order.push(reply);
                queue.push_back(reply);
            }
        }
    }

    order.reverse();
    order
}

/// Why a requester is allowed to delete a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAuthority {
    CommentAuthor,
    PostAuthor,
}

/// A comment may be deleted by its author or by the author of its post.
///
/// `post` must be the post the comment belongs to.
pub fn authorize_delete(
    comment: &Comment,
    post: &Post,
    requester: UserId,
) -> Result<DeleteAuthority, DomainError> {
    if comment.post_id != post.id {
        return Err(DomainError::Validation(format!(
            "Comment {} does not belong to post {}",
            comment.id, post.id
        )));
    }

    if requester == comment.author_id {
        Ok(DeleteAuthority::CommentAuthor)
    } else if requester == post.author_id {
        Ok(DeleteAuthority::PostAuthor)
    } else {
        Err(DomainError::PermissionDenied(
            "Only the comment author or the post author may delete this comment".to_string(),
        ))
    }
}

pub fn can_delete(comment: &Comment, post: &Post, requester: UserId) -> bool {
    authorize_delete(comment, post, requester).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use uuid::Uuid;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn comment_on(post: Uuid, n: u128, parent: Option<u128>, offset_secs: i64) -> Comment {
        Comment {
            id: id(n),
            post_id: post,
            author_id: id(1000),
            parent_id: parent.map(id),
            content: format!("comment {n}"),
            created_at: base_time() + TimeDelta::seconds(offset_secs),
        }
    }

    fn comment(n: u128, parent: Option<u128>, offset_secs: i64) -> Comment {
        comment_on(id(500), n, parent, offset_secs)
    }

    fn ids<T: Threaded>(nodes: &[CommentNode<T>]) -> Vec<Uuid> {
        nodes.iter().map(|node| node.item.id()).collect()
    }

    fn find<'a>(nodes: &'a [CommentNode<Comment>], target: Uuid) -> Option<&'a CommentNode<Comment>> {
        for node in nodes {
            if node.item.id == target {
                return Some(node);
            }
            if let Some(found) = find(&node.replies, target) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn test_empty_input_builds_empty_forest() {
        let forest = build_tree(Vec::<Comment>::new());
        assert!(forest.is_empty());
    }

    #[test]
    fn test_concrete_tree_scenario() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
            comment(4, None, 3),
        ];

        let forest = build_tree(comments.clone());

        assert_eq!(ids(&forest), vec![id(1), id(4)]);
        assert_eq!(ids(&forest[0].replies), vec![id(2)]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![id(3)]);
        assert!(forest[1].replies.is_empty());

        let planned = plan_cascading_delete(&comments, id(1));
        assert_eq!(planned, HashSet::from([id(1), id(2), id(3)]));
    }

    #[test]
    fn test_every_comment_appears_once() {
        // Shuffled input with a missing parent, a self-reference and a cycle.
        let comments = vec![
            comment(7, Some(6), 7),
            comment(3, Some(1), 3),
            comment(1, None, 1),
            comment(5, Some(99), 5),
            comment(4, Some(4), 4),
            comment(6, Some(7), 6),
            comment(2, Some(1), 2),
            comment(8, Some(3), 8),
        ];

        let forest = build_tree(comments.clone());

        assert_eq!(count_all(&forest), comments.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<&CommentNode<Comment>> = forest.iter().collect();
        while let Some(node) = stack.pop() {
            assert!(seen.insert(node.item.id), "duplicate {}", node.item.id);
            stack.extend(node.replies.iter());
        }
        assert_eq!(seen.len(), comments.len());
    }

    #[test]
    fn test_replies_attach_to_their_parent() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(1), 2),
            comment(4, Some(3), 3),
        ];

        let forest = build_tree(comments.clone());

        for c in &comments {
            let Some(parent) = c.parent_id else { continue };
            let parent_node = find(&forest, parent).unwrap();
            assert!(parent_node.replies.iter().any(|r| r.item.id == c.id));
            assert!(!forest.iter().any(|root| root.item.id == c.id));
        }
    }

    #[test]
    fn test_orphans_are_promoted_to_roots() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(42), 1),
            comment(3, Some(3), 2),
        ];

        let forest = build_tree(comments);

        assert_eq!(ids(&forest), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn test_cross_post_parent_is_treated_as_orphan() {
        let other_post = id(600);
        let comments = vec![
            comment_on(other_post, 1, None, 0),
            comment(2, Some(1), 1),
        ];

        let forest = build_tree(comments);

        assert_eq!(ids(&forest), vec![id(1), id(2)]);
    }

    #[test]
    fn test_parent_cycle_members_become_roots() {
        let comments = vec![
            comment(1, Some(2), 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ];

        let forest = build_tree(comments);

        assert_eq!(ids(&forest), vec![id(1), id(2)]);
        assert_eq!(ids(&forest[1].replies), vec![id(3)]);
        assert_eq!(count_all(&forest), 3);
    }

    #[test]
    fn test_siblings_sorted_by_created_at() {
        let comments = vec![
            comment(4, Some(1), 30),
            comment(2, Some(1), 10),
            comment(1, None, 0),
            comment(3, Some(1), 20),
            comment(5, None, -5),
        ];

        let forest = build_tree(comments);

        assert_eq!(ids(&forest), vec![id(5), id(1)]);
        assert_eq!(ids(&forest[1].replies), vec![id(2), id(3), id(4)]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let comments = vec![comment(9, None, 0), comment(3, None, 0), comment(6, None, 0)];

        let forest = build_tree(comments);

        assert_eq!(ids(&forest), vec![id(9), id(3), id(6)]);
    }

    #[test]
    fn test_deep_chain_builds_without_recursion_limits() {
        let comments: Vec<Comment> = (1..=2_000u128)
            .map(|n| comment(n, (n > 1).then(|| n - 1), n as i64))
            .collect();

        let forest = build_tree(comments);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].count(), 2_000);
        assert_eq!(forest[0].depth(), 2_000);
    }

    #[test]
    fn test_capped_tree_moves_deep_replies_up_to_the_limit() {
        let mut comments: Vec<Comment> = (1..=6u128)
            .map(|n| comment(n, (n > 1).then(|| n - 1), n as i64))
            .collect();
        comments.push(comment(7, Some(3), 100));
        comments.push(comment(8, Some(1), 101));

        let forest = build_tree_capped(comments, 3);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].depth(), 3);
        assert_eq!(forest[0].count(), 8);
        assert_eq!(ids(&forest[0].replies), vec![id(2), id(8)]);
        let second = find(&forest, id(2)).unwrap();
        assert_eq!(ids(&second.replies), vec![id(3), id(4), id(5), id(6), id(7)]);
    }

    #[test]
    fn test_capped_tree_bounds_a_long_chain() {
        let comments: Vec<Comment> = (1..=10_000u128)
            .map(|n| comment(n, (n > 1).then(|| n - 1), n as i64))
            .collect();

        let forest = build_tree_capped(comments, 32);

        assert_eq!(count_all(&forest), 10_000);
        assert_eq!(forest[0].depth(), 32);
    }

    #[test]
    fn test_smallest_cap_keeps_one_level_of_replies() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ];

        let forest = build_tree_capped(comments, 0);

        assert_eq!(ids(&forest), vec![id(1)]);
        assert_eq!(ids(&forest[0].replies), vec![id(2), id(3)]);
    }

    #[test]
    fn test_thread_depth() {
        let other_post = id(501);
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
            comment_on(other_post, 4, Some(3), 3),
        ];

        assert_eq!(thread_depth(&comments, id(1)), 1);
        assert_eq!(thread_depth(&comments, id(3)), 3);
        assert_eq!(thread_depth(&comments, id(4)), 1);
        assert_eq!(thread_depth(&comments, id(99)), 0);
    }

    #[test]
    fn test_cascading_delete_closure_on_chain() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
            comment(4, Some(3), 3),
        ];

        let planned = plan_cascading_delete(&comments, id(1));

        assert_eq!(planned, HashSet::from([id(1), id(2), id(3), id(4)]));
    }

    #[test]
    fn test_cascading_delete_leaves_siblings_untouched() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
            comment(5, Some(1), 3),
            comment(6, Some(5), 4),
            comment(7, None, 5),
        ];

        let planned = plan_cascading_delete(&comments, id(2));

        assert_eq!(planned, HashSet::from([id(2), id(3)]));
    }

    #[test]
    fn test_cascading_delete_terminates_on_cycles() {
        let comments = vec![comment(1, Some(2), 0), comment(2, Some(1), 1)];

        let planned = plan_cascading_delete(&comments, id(1));

        assert_eq!(planned, HashSet::from([id(1), id(2)]));
    }

    #[test]
    fn test_cascading_delete_of_unknown_target() {
        let comments = vec![comment(1, None, 0)];

        let planned = plan_cascading_delete(&comments, id(77));

        assert_eq!(planned, HashSet::from([id(77)]));
    }

    #[test]
    fn test_ordered_plan_is_leaves_first() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ];

        let ordered = plan_cascading_delete_ordered(&comments, id(1));

        assert_eq!(ordered, vec![id(3), id(2), id(1)]);
    }

    fn post_by(author: Uuid) -> Post {
        Post {
            id: id(500),
            author_id: author,
            title: "t".to_string(),
            content: String::new(),
            slug: "t".to_string(),
            image_ref: None,
            vote_total: 0,
            created_at: base_time(),
            updated_at: base_time(),
        }
    }

    #[test]
    fn test_authorization_matrix() {
        let comment_author = id(1000);
        let post_author = id(2000);
        let stranger = id(3000);
        let post = post_by(post_author);
        let c = comment(1, None, 0);

        assert_eq!(
            authorize_delete(&c, &post, comment_author).unwrap(),
            DeleteAuthority::CommentAuthor
        );
        assert_eq!(
            authorize_delete(&c, &post, post_author).unwrap(),
            DeleteAuthority::PostAuthor
        );
        assert!(matches!(
            authorize_delete(&c, &post, stranger),
            Err(DomainError::PermissionDenied(_))
        ));
        for n in 0..50u128 {
            let requester = id(10_000 + n);
            assert!(!can_delete(&c, &post, requester));
        }
    }

    #[test]
    fn test_authorization_rejects_mismatched_post() {
        let post = post_by(id(2000));
        let c = comment_on(id(600), 1, None, 0);

        assert!(matches!(
            authorize_delete(&c, &post, id(1000)),
            Err(DomainError::Validation(_))
        ));
    }
}
