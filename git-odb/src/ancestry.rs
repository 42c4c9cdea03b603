//! Commit ancestry: `walk_ancestry`, `find_merge_base`, `is_ancestor`. A
//! binary heap keyed by `(committer timestamp, id)` replaces recursion so a
//! long linear history never risks a stack overflow.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use git_hash::ObjectId;

use crate::commits::Commits;
use crate::store::GitObjectStore;
use crate::Error;

/// Options accepted by [`walk_ancestry`]. `Default` yields an
/// unbounded, unpruned, all-parents walk.
#[derive(Debug, Clone, Default)]
pub struct WalkAncestryOptions {
    pub limit: Option<usize>,
    pub stop_at: Vec<ObjectId>,
    pub first_parent_only: bool,
}

struct HeapItem {
    timestamp: i64,
    id: ObjectId,
    parents: Vec<ObjectId>,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.id == other.id
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Committer timestamp descending, tie-broken by id ascending: a [`BinaryHeap`] pops the greatest element, so ties must
/// rank the *smaller* id as greater to come out first.
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp).then_with(|| other.id.cmp(&self.id))
    }
}

/// Closure of every ancestor of `start` (including `start` itself),
/// computed without priority ordering since [`find_merge_base`] only
/// needs set membership.
fn ancestor_closure<S: GitObjectStore>(commits: &Commits<'_, S>, start: ObjectId) -> Result<HashSet<ObjectId>, Error> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        for parent in commits.get_parents(id.as_oid())? {
            queue.push_back(parent);
        }
    }
    Ok(seen)
}

/// Priority-queue walk over every commit reachable from `start_ids`,
/// ordered by committer timestamp descending (ties by id ascending).
/// `stop_at` members and their ancestors are pruned entirely from the
/// output; `first_parent_only` restricts expansion to `parents[0]`.
pub fn walk_ancestry<S: GitObjectStore>(
    commits: &Commits<'_, S>,
    start_ids: impl IntoIterator<Item = ObjectId>,
    options: &WalkAncestryOptions,
) -> Result<Vec<ObjectId>, Error> {
    let mut excluded = HashSet::new();
    for stop in &options.stop_at {
        excluded.extend(ancestor_closure(commits, *stop)?);
    }

    let mut heap = BinaryHeap::new();
    let mut visited = HashSet::new();
    let enqueue = |heap: &mut BinaryHeap<HeapItem>, visited: &mut HashSet<ObjectId>, id: ObjectId| -> Result<(), Error> {
        if excluded.contains(&id) || !visited.insert(id) {
            return Ok(());
        }
        let commit = commits.load(id.as_oid())?;
        heap.push(HeapItem {
            timestamp: commit.committer.time.seconds_since_epoch,
            id,
            parents: commit.parents,
        });
        Ok(())
    };

    for id in start_ids {
        enqueue(&mut heap, &mut visited, id)?;
    }

    let mut out = Vec::new();
    while let Some(item) = heap.pop() {
        if let Some(limit) = options.limit {
            if out.len() >= limit {
                break;
            }
        }
        out.push(item.id);
        let parents: &[ObjectId] = if options.first_parent_only {
            item.parents.get(..1).unwrap_or(&[])
        } else {
            &item.parents
        };
        for &parent in parents {
            enqueue(&mut heap, &mut visited, parent)?;
        }
    }
    Ok(out)
}

/// Whether `candidate` is `descendant` itself or reachable by walking
/// `descendant`'s parents.
pub fn is_ancestor<S: GitObjectStore>(commits: &Commits<'_, S>, candidate: ObjectId, descendant: ObjectId) -> Result<bool, Error> {
    if candidate == descendant {
        return Ok(true);
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([descendant]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        for parent in commits.get_parents(id.as_oid())? {
            if parent == candidate {
                return Ok(true);
            }
            queue.push_back(parent);
        }
    }
    Ok(false)
}

/// The lowest common ancestors of `a` and `b`: common ancestors, none of
/// which is itself an ancestor of another element of the returned set.
pub fn find_merge_base<S: GitObjectStore>(commits: &Commits<'_, S>, a: ObjectId, b: ObjectId) -> Result<Vec<ObjectId>, Error> {
    let ancestors_a = ancestor_closure(commits, a)?;
    let ancestors_b = ancestor_closure(commits, b)?;
    let common: Vec<ObjectId> = ancestors_a.intersection(&ancestors_b).copied().collect();

    let mut result = Vec::new();
    for &candidate in &common {
        let mut dominated = false;
        for &other in &common {
            if other != candidate && is_ancestor(commits, candidate, other)? {
                dominated = true;
                break;
            }
        }
        if !dominated {
            result.push(candidate);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose;
    use git_object::{Commit, PersonIdent, Time};

    fn ident(ts: i64) -> PersonIdent {
        PersonIdent {
            name: "a".into(),
            email: "a@example.com".into(),
            time: Time {
                seconds_since_epoch: ts,
                offset_minutes: 0,
            },
        }
    }

    fn commit_at(ts: i64, tree: ObjectId, parents: Vec<ObjectId>) -> Commit {
        Commit {
            tree,
            parents,
            author: ident(ts),
            committer: ident(ts),
            encoding: None,
            gpg_signature: None,
            message: format!("commit at {ts}\n"),
        }
    }

    #[test]
    fn linear_chain_walks_newest_first_and_respects_parents() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut commits = Commits::new(&mut store);

        let a = commits.store(&commit_at(1, git_hash::EMPTY_TREE, vec![])).unwrap();
        let b = commits.store(&commit_at(2, git_hash::EMPTY_TREE, vec![a])).unwrap();
        let c = commits.store(&commit_at(3, git_hash::EMPTY_TREE, vec![b])).unwrap();

        let order = walk_ancestry(&commits, [c], &WalkAncestryOptions::default()).unwrap();
        assert_eq!(order, vec![c, b, a]);
        assert_eq!(commits.get_parents(c.as_oid()).unwrap(), vec![b]);
        assert!(is_ancestor(&commits, a, c).unwrap());
        assert!(!is_ancestor(&commits, c, a).unwrap());
    }

    #[test]
    fn stop_at_prunes_its_own_ancestors_from_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut commits = Commits::new(&mut store);

        let a = commits.store(&commit_at(1, git_hash::EMPTY_TREE, vec![])).unwrap();
        let b = commits.store(&commit_at(2, git_hash::EMPTY_TREE, vec![a])).unwrap();
        let c = commits.store(&commit_at(3, git_hash::EMPTY_TREE, vec![b])).unwrap();

        let options = WalkAncestryOptions {
            stop_at: vec![a],
            ..Default::default()
        };
        let order = walk_ancestry(&commits, [c], &options).unwrap();
        assert_eq!(order, vec![c, b]);
    }

    #[test]
    fn merge_base_returns_common_ancestors_with_none_dominating_another() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut commits = Commits::new(&mut store);

        let root = commits.store(&commit_at(1, git_hash::EMPTY_TREE, vec![])).unwrap();
        let b = commits.store(&commit_at(2, git_hash::EMPTY_TREE, vec![root])).unwrap();
        let c = commits.store(&commit_at(2, git_hash::EMPTY_TREE, vec![root])).unwrap();
        let d = commits.store(&commit_at(3, git_hash::EMPTY_TREE, vec![b, c])).unwrap();
        let e = commits.store(&commit_at(3, git_hash::EMPTY_TREE, vec![c, b])).unwrap();

        let bases = find_merge_base(&commits, d, e).unwrap();
        assert!(!bases.is_empty());
        for &base in &bases {
            assert!(base == b || base == c);
        }
        for &base in &bases {
            for &other in &bases {
                if base != other {
                    assert!(!is_ancestor(&commits, base, other).unwrap());
                }
            }
        }
    }
}
