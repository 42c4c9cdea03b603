use std::fmt;

/// A tree entry's mode: plain file, executable, symlink, directory, or
/// gitlink (submodule commit reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    File,
    Executable,
    Symlink,
    Tree,
    Commit,
}

impl Mode {
    /// The raw octal value as Git writes it, e.g. `0o100644` for a file.
    pub fn as_octal(self) -> u32 {
        match self {
            Mode::File => 0o100644,
            Mode::Executable => 0o100755,
            Mode::Symlink => 0o120000,
            Mode::Tree => 0o040000,
            Mode::Commit => 0o160000,
        }
    }

    /// Parse the ASCII-octal mode text used in tree entries and directory
    /// listings (no leading zero-padding requirement).
    pub fn from_octal_str(text: &str) -> Option<Self> {
        let value = u32::from_str_radix(text, 8).ok()?;
        Self::from_octal(value)
    }

    pub fn from_octal(value: u32) -> Option<Self> {
        match value {
            0o100644 => Some(Mode::File),
            0o100755 => Some(Mode::Executable),
            0o120000 => Some(Mode::Symlink),
            0o040000 => Some(Mode::Tree),
            0o160000 => Some(Mode::Commit),
            _ => None,
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, Mode::Tree)
    }

    /// The ASCII-octal representation with no leading zero, as written in
    /// tree entry bytes.
    pub fn to_octal_ascii(self) -> String {
        format!("{:o}", self.as_octal())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_octal_ascii())
    }
}
