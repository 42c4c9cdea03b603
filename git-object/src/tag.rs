use git_hash::ObjectId;

use crate::framing::Error;
use crate::{Kind, PersonIdent};

/// An annotated tag object: a named pointer to another object with its own
/// metadata, distinct from a lightweight tag (which is just a ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub target: ObjectId,
    pub target_kind: Kind,
    pub name: String,
    pub tagger: Option<PersonIdent>,
    pub message: String,
}

impl Tag {
    /// Serialize: `object`, `objectType`, `tag`, optional
    /// `tagger`, a blank line, then the message.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"object ");
        out.extend_from_slice(self.target.to_hex().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(b"objectType ");
        out.extend_from_slice(self.target_kind.as_str().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(b"tag ");
        out.extend_from_slice(self.name.as_bytes());
        out.push(b'\n');
        if let Some(tagger) = &self.tagger {
            out.extend_from_slice(b"tagger ");
            tagger.write_to(out);
            out.push(b'\n');
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

        let mut target = None;
        let mut target_kind = None;
        let mut name = None;
        let mut tagger = None;
        for line in header.split('\n') {
            if let Some(rest) = line.strip_prefix("object ") {
                target = Some(ObjectId::from_hex(rest).map_err(|_| Error::InvalidSize(rest.to_owned()))?);
            } else if let Some(rest) = line.strip_prefix("objectType ") {
                target_kind = Some(Kind::from_bytes(rest.as_bytes()).ok_or_else(|| Error::UnknownType(rest.to_owned()))?);
            } else if let Some(rest) = line.strip_prefix("tag ") {
                name = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("tagger ") {
                tagger = Some(PersonIdent::parse(rest)?);
            }
        }

        Ok(Self {
            target: target.ok_or(Error::MissingField("object"))?,
            target_kind: target_kind.ok_or(Error::MissingField("objectType"))?,
            name: name.ok_or(Error::MissingField("tag"))?,
            tagger,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person_ident::Time;

    #[test]
    fn write_then_parse_roundtrips() {
        let tag = Tag {
            target: git_hash::EMPTY_TREE,
            target_kind: Kind::Tree,
            name: "v1.0.0".into(),
            tagger: Some(PersonIdent {
                name: "Release Bot".into(),
                email: "bot@example.com".into(),
                time: Time {
                    seconds_since_epoch: 1_700_000_000,
                    offset_minutes: 0,
                },
            }),
            message: "Release v1.0.0\n".into(),
        };
        let bytes = tag.to_bytes();
        let parsed = Tag::parse(&bytes).unwrap();
        assert_eq!(parsed, tag);
    }
}
