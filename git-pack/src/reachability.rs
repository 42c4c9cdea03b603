//! Reachability enumeration: walk from a set of root tree ids down
//! through every subtree to every blob, excluding whatever is reachable
//! from a separate set of excluded roots. `git-repository` builds the
//! commit-level closure (commits -> their root trees, tags -> their
//! targets) on top of this using `git-odb`'s ancestry walk; this crate
//! only needs to know about trees and blobs.

use std::collections::HashSet;

use git_hash::{oid, ObjectId};
use git_object::{Tree, TreeEntry};
use git_traverse::tree::{breadthfirst, Action, State, Visit};

struct Collector<'s> {
    seen: &'s mut HashSet<ObjectId>,
    out: &'s mut Vec<ObjectId>,
}

impl Visit for Collector<'_> {
    fn visit_tree(&mut self, entry: &TreeEntry) -> Action {
        if !self.seen.insert(entry.id) {
            return Action::Skip;
        }
        self.out.push(entry.id);
        Action::Continue
    }

    fn visit_nontree(&mut self, entry: &TreeEntry) -> Action {
        if self.seen.insert(entry.id) {
            self.out.push(entry.id);
        }
        Action::Continue
    }
}

/// Collect every tree and blob id reachable from `roots`, excluding the
/// closure reachable from `excluded_roots`. Root ids that are themselves
/// excluded are dropped from the result too. `resolve_tree` must return a
/// parsed [`Tree`] for any tree id this walk asks about.
pub fn collect_reachable_trees(
    roots: impl IntoIterator<Item = ObjectId>,
    excluded_roots: impl IntoIterator<Item = ObjectId>,
    mut resolve_tree: impl FnMut(&oid) -> Option<Tree>,
) -> Result<Vec<ObjectId>, git_traverse::tree::Error> {
    let mut state = State::default();

    let mut excluded = HashSet::new();
    let mut excluded_order = Vec::new();
    for root in excluded_roots {
        if excluded.insert(root) {
            excluded_order.push(root);
            let mut collector = Collector {
                seen: &mut excluded,
                out: &mut excluded_order,
            };
            breadthfirst(root, &mut state, &mut resolve_tree, &mut collector)?;
        }
    }

    let mut seen = excluded;
    let mut out = Vec::new();
    for root in roots {
        if !seen.insert(root) {
            continue;
        }
        out.push(root);
        let mut collector = Collector {
            seen: &mut seen,
            out: &mut out,
        };
        breadthfirst(root, &mut state, &mut resolve_tree, &mut collector)?;
    }
    Ok(out)
}
