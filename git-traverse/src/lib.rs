//! Generic traversal over the object graph: a breadth-first
//! walk of a tree's entries, used by the pack reachability enumeration to
//! collect every subtree and blob reachable from a root tree. Commit-level
//! ancestry walking is typed over `Commit` and lives in `git-odb` instead,
//! since it needs committer-timestamp ordering that a generic tree walk has
//! no use for.
#![deny(rust_2018_idioms)]

pub mod tree;
