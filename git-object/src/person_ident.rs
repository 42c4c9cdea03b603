use std::fmt;

use crate::framing::Error;

/// A point in time expressed the way Git commits do: seconds since the Unix
/// epoch plus a signed timezone offset in minutes, rendered as `±HHMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub seconds_since_epoch: i64,
    pub offset_minutes: i32,
}

impl Time {
    pub fn format_offset(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let total = self.offset_minutes.unsigned_abs();
        format!("{sign}{:02}{:02}", total / 60, total % 60)
    }

    pub fn parse_offset(text: &str) -> Option<i32> {
        if text.len() != 5 {
            return None;
        }
        let sign = match text.as_bytes()[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return None,
        };
        let hours: i32 = text[1..3].parse().ok()?;
        let minutes: i32 = text[3..5].parse().ok()?;
        Some(sign * (hours * 60 + minutes))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seconds_since_epoch, self.format_offset())
    }
}

/// Author/committer/tagger identity: name, email, and a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonIdent {
    pub name: String,
    pub email: String,
    pub time: Time,
}

impl PersonIdent {
    /// Serialize as `"<name> <email> <ts> <tz>"`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(b" <");
        out.extend_from_slice(self.email.as_bytes());
        out.extend_from_slice(b"> ");
        out.extend_from_slice(self.time.to_string().as_bytes());
    }

    /// Parse a `"<name> <email> <ts> <tz>"` line (without the leading
    /// `author `/`committer `/`tagger ` keyword, already stripped).
    pub fn parse(line: &str) -> Result<Self, Error> {
        let lt = line
            .rfind(" <")
            .ok_or_else(|| Error::MissingSpace)?;
        let name = line[..lt].to_string();
        let rest = &line[lt + 2..];
        let gt = rest.find('>').ok_or(Error::MissingSpace)?;
        let email = rest[..gt].to_string();
        let rest = rest[gt + 1..].trim_start();
        let mut parts = rest.rsplitn(2, ' ');
        let tz = parts.next().ok_or(Error::MissingSpace)?;
        let ts = parts.next().ok_or(Error::MissingSpace)?;
        let seconds_since_epoch: i64 = ts.parse().map_err(|_| Error::InvalidSize(ts.to_owned()))?;
        let offset_minutes = Time::parse_offset(tz).ok_or_else(|| Error::InvalidSize(tz.to_owned()))?;
        Ok(Self {
            name,
            email,
            time: Time {
                seconds_since_epoch,
                offset_minutes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersonIdent {
        PersonIdent {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            time: Time {
                seconds_since_epoch: 1_700_000_000,
                offset_minutes: -300,
            },
        }
    }

    #[test]
    fn negative_offset_formats_with_minus_sign() {
        assert_eq!(sample().time.format_offset(), "-0500");
    }

    #[test]
    fn write_then_parse_roundtrips() {
        let ident = sample();
        let mut buf = Vec::new();
        ident.write_to(&mut buf);
        let line = String::from_utf8(buf).unwrap();
        let parsed = PersonIdent::parse(&line).unwrap();
        assert_eq!(parsed, ident);
    }
}
