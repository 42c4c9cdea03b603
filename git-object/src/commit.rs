use git_hash::ObjectId;

use crate::framing::Error;
use crate::PersonIdent;

/// An immutable snapshot plus ancestry and authorship metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: PersonIdent,
    pub committer: PersonIdent,
    pub encoding: Option<String>,
    /// Preserved verbatim; this crate never verifies signatures.
    pub gpg_signature: Option<Vec<u8>>,
    pub message: String,
}

/// Headers that carry a multi-line value (only `gpgsig` today) continue
/// subsequent lines with a single leading space, matching Git's generic
/// header-continuation convention.
fn write_continued_header(out: &mut Vec<u8>, key: &str, value: &[u8]) {
    out.extend_from_slice(key.as_bytes());
    out.push(b' ');
    for (i, line) in value.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
            out.push(b' ');
        }
        out.extend_from_slice(line);
    }
    out.push(b'\n');
}

fn read_continued_header<'a>(lines: &mut std::iter::Peekable<std::slice::Iter<'a, &'a str>>) -> Vec<u8> {
    let mut value = Vec::new();
    while let Some(&&next) = lines.peek() {
        if let Some(cont) = next.strip_prefix(' ') {
            if !value.is_empty() {
                value.push(b'\n');
            }
            value.extend_from_slice(cont.as_bytes());
            lines.next();
        } else {
            break;
        }
    }
    value
}

impl Commit {
    /// Serialize: `tree`, then one `parent` line per parent in
    /// order, `author`, `committer`, optional `encoding`, optional
    /// `gpgsig`, a blank line, then the message bytes.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');
        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(b"author ");
        self.author.write_to(out);
        out.push(b'\n');
        out.extend_from_slice(b"committer ");
        self.committer.write_to(out);
        out.push(b'\n');
        if let Some(encoding) = &self.encoding {
            out.extend_from_slice(b"encoding ");
            out.extend_from_slice(encoding.as_bytes());
            out.push(b'\n');
        }
        if let Some(sig) = &self.gpg_signature {
            write_continued_header(out, "gpgsig", sig);
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data).map_err(Error::InvalidUtf8)?;
        let header_end = text.find("\n\n").ok_or(Error::MissingBlankLine)?;
        let header = &text[..header_end];
        let message = text[header_end + 2..].to_string();

        let line_vec: Vec<&str> = header.split('\n').collect();
        let mut lines = line_vec.iter().peekable();

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut encoding = None;
        let mut gpg_signature = None;

        while let Some(&line) = lines.next() {
            if let Some(rest) = line.strip_prefix("tree ") {
                tree = Some(ObjectId::from_hex(rest).map_err(|_| Error::InvalidSize(rest.to_owned()))?);
            } else if let Some(rest) = line.strip_prefix("parent ") {
                parents.push(ObjectId::from_hex(rest).map_err(|_| Error::InvalidSize(rest.to_owned()))?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(PersonIdent::parse(rest)?);
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(PersonIdent::parse(rest)?);
            } else if let Some(rest) = line.strip_prefix("encoding ") {
                encoding = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("gpgsig ") {
                let mut value = rest.as_bytes().to_vec();
                let continuation = read_continued_header(&mut lines);
                if !continuation.is_empty() {
                    value.push(b'\n');
                    value.extend_from_slice(&continuation);
                }
                gpg_signature = Some(value);
            }
        }

        Ok(Self {
            tree: tree.ok_or(Error::MissingField("tree"))?,
            parents,
            author: author.ok_or(Error::MissingField("author"))?,
            committer: committer.ok_or(Error::MissingField("committer"))?,
            encoding,
            gpg_signature,
            message,
        })
    }
}
