//! Breadth-first traversal of a tree and its subtrees: a `Visit` delegate
//! driven by a caller-supplied resolver, operating on this engine's byte
//! paths rather than a `BStr` dependency since nothing here needs to
//! preserve path segments, only to collect reachable ids.

use git_hash::{oid, ObjectId};
use git_object::{Tree, TreeEntry};

/// What a tree-walk delegate decides to do with each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep walking into this entry if it's a subtree.
    Continue,
    /// Don't descend into this entry even if it's a subtree.
    Skip,
}

/// Receives every entry the walk visits, in breadth-first order.
pub trait Visit {
    fn visit_tree(&mut self, entry: &TreeEntry) -> Action;
    fn visit_nontree(&mut self, entry: &TreeEntry) -> Action;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tree {0} could not be resolved during traversal")]
    NotFound(ObjectId),
}

/// Reusable queue storage so a caller driving many traversals (one per
/// pack-reachability root) can avoid reallocating it each time.
#[derive(Default)]
pub struct State {
    queue: std::collections::VecDeque<ObjectId>,
}

/// Visit `root` and every subtree reachable from it, calling `resolve` to
/// turn a tree id into its parsed `Tree` and `delegate` for every entry
/// encountered. Each tree is resolved at most once even if referenced from
/// multiple parents, since `delegate` is expected to track what it has
/// already seen (an "all unseen" delegate); this function itself does not
/// deduplicate trees, only order the walk.
pub fn breadthfirst(
    root: ObjectId,
    state: &mut State,
    mut resolve: impl FnMut(&oid) -> Option<Tree>,
    delegate: &mut impl Visit,
) -> Result<(), Error> {
    state.queue.clear();
    state.queue.push_back(root);
    while let Some(id) = state.queue.pop_front() {
        let tree = resolve(id.as_oid()).ok_or(Error::NotFound(id))?;
        for entry in tree.entries() {
            if entry.mode.is_tree() {
                if let Action::Continue = delegate.visit_tree(entry) {
                    state.queue.push_back(entry.id);
                }
            } else {
                delegate.visit_nontree(entry);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_object::Mode;
    use std::collections::HashMap;

    fn entry(name: &str, mode: Mode, id: ObjectId) -> TreeEntry {
        TreeEntry {
            name: name.as_bytes().to_vec(),
            mode,
            id,
        }
    }

    struct Collect {
        trees: Vec<ObjectId>,
        blobs: Vec<ObjectId>,
    }

    impl Visit for Collect {
        fn visit_tree(&mut self, entry: &TreeEntry) -> Action {
            self.trees.push(entry.id);
            Action::Continue
        }
        fn visit_nontree(&mut self, entry: &TreeEntry) -> Action {
            self.blobs.push(entry.id);
            Action::Continue
        }
    }

    #[test]
    fn walks_nested_trees_breadth_first() {
        let blob_a = ObjectId::from_hex("0000000000000000000000000000000000000a").unwrap();
        let blob_b = ObjectId::from_hex("0000000000000000000000000000000000000b").unwrap();
        let sub_id = ObjectId::from_hex("0000000000000000000000000000000000000c").unwrap();
        let root_id = ObjectId::from_hex("0000000000000000000000000000000000000d").unwrap();

        let sub = Tree::from_sorted_entries(vec![entry("x", Mode::File, blob_b)]);
        let root = Tree::from_sorted_entries(vec![entry("a", Mode::File, blob_a), entry("sub", Mode::Tree, sub_id)]);

        let mut trees = HashMap::new();
        trees.insert(root_id, root);
        trees.insert(sub_id, sub);

        let mut state = State::default();
        let mut collect = Collect {
            trees: Vec::new(),
            blobs: Vec::new(),
        };
        breadthfirst(root_id, &mut state, |id| trees.get(&id.to_owned()).cloned(), &mut collect).unwrap();

        assert_eq!(collect.trees, vec![sub_id]);
        assert_eq!(collect.blobs, vec![blob_a, blob_b]);
    }

    #[test]
    fn skip_prevents_descent() {
        let sub_id = ObjectId::from_hex("00000000000000000000000000000000000001").unwrap();
        let root_id = ObjectId::from_hex("00000000000000000000000000000000000002").unwrap();
        let sub = Tree::from_sorted_entries(vec![]);
        let root = Tree::from_sorted_entries(vec![entry("sub", Mode::Tree, sub_id)]);
        let mut trees = HashMap::new();
        trees.insert(root_id, root);
        trees.insert(sub_id, sub);

        struct SkipAll;
        impl Visit for SkipAll {
            fn visit_tree(&mut self, _entry: &TreeEntry) -> Action {
                Action::Skip
            }
            fn visit_nontree(&mut self, _entry: &TreeEntry) -> Action {
                Action::Continue
            }
        }

        let mut state = State::default();
        let mut delegate = SkipAll;
        // sub_id is never looked up because we skipped it; if it were
        // dereferenced this resolver would panic.
        breadthfirst(root_id, &mut state, |id| if id == root_id.as_oid() { trees.get(&root_id).cloned() } else { panic!("should not resolve skipped subtree") }, &mut delegate).unwrap();
    }
}
