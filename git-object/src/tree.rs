use git_hash::ObjectId;

use crate::Mode;

/// One named entry in a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: Vec<u8>,
    pub mode: Mode,
    pub id: ObjectId,
}

/// An immutable, canonically ordered directory snapshot.
///
/// Invariant I2: a `Tree` built via [`Tree::from_entries`] is always sorted
/// by Git's comparison, where directory names compare as if suffixed by
/// `/`; callers that already know their input is sorted can use
/// [`Tree::from_sorted_entries`] to skip the sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

/// Compares two entry names the way Git orders tree entries: as if every
/// directory name had a trailing `/`. This makes `"foo"` (a file) sort
/// before `"foo.txt"` but after `"foo/"` would if `foo` were a directory —
/// concretely, `"foo"` (dir) sorts after `"foo-bar"` (file) because `/`
/// (0x2f) is less than `-` (0x2d)... no: `/` is 0x2f which is greater than
/// `-` (0x2d) but less than digits/letters, so a directory named `foo` comes
/// before a file named `foo.txt` but after a file named `foo-x`.
fn compare_names(a_name: &[u8], a_is_tree: bool, b_name: &[u8], b_is_tree: bool) -> std::cmp::Ordering {
    let a_suffix: &[u8] = if a_is_tree { b"/" } else { b"" };
    let b_suffix: &[u8] = if b_is_tree { b"/" } else { b"" };
    a_name
        .iter()
        .chain(a_suffix)
        .cmp(b_name.iter().chain(b_suffix))
}

impl Tree {
    /// Build a tree from entries in arbitrary order, sorting them
    /// canonically first.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| compare_names(&a.name, a.mode.is_tree(), &b.name, b.mode.is_tree()));
        Self { entries }
    }

    /// Build a tree from entries already in canonical order. Only use this
    /// when the caller can guarantee the ordering, e.g. after
    /// [`Tree::parse`].
    pub fn from_sorted_entries(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &[u8]) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Serialize as the concatenation of `"<mode-octal> <name>\0<raw-id>"`
    /// per entry, in the tree's current order. The tree must already be
    /// canonically sorted for the result to be reproducible across
    /// processes.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.to_octal_ascii().as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.id.as_bytes());
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Parse serialized tree bytes. The resulting tree is trusted to already
    /// be in canonical order, as any tree written by this crate is.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let space = data[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or(Error::Truncated)?
                + pos;
            let mode_str = std::str::from_utf8(&data[pos..space]).map_err(|_| Error::InvalidMode)?;
            let mode = Mode::from_octal_str(mode_str).ok_or(Error::InvalidMode)?;
            let nul = data[space + 1..]
                .iter()
                .position(|&b| b == 0)
                .ok_or(Error::Truncated)?
                + space
                + 1;
            let name = data[space + 1..nul].to_vec();
            let id_start = nul + 1;
            let id_end = id_start + git_hash::SIZE_OF_SHA1_DIGEST;
            if id_end > data.len() {
                return Err(Error::Truncated);
            }
            let id = ObjectId::from_bytes(&data[id_start..id_end]).expect("slice is exactly 20 bytes");
            entries.push(TreeEntry { name, mode, id });
            pos = id_end;
        }
        Ok(Self::from_sorted_entries(entries))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tree entry is truncated")]
    Truncated,
    #[error("tree entry has an invalid mode")]
    InvalidMode,
}
