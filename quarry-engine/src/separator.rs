//! Record separator specification: literal bytes or a regex pattern
//!
//! A spec prefixed with `re:` compiles as a byte-oriented regular
//! expression; anything else is a literal with standard escapes. Both
//! compile once at import startup, and failures abort before any data is
//! read.

use regex::bytes::Regex;

use crate::{Error, Result};

/// Marker that switches a separator spec into regex mode.
pub const REGEX_MARKER: &str = "re:";

/// A compiled record separator.
#[derive(Debug, Clone)]
pub enum Separator {
    Literal(Vec<u8>),
    Pattern(Regex),
}

impl Separator {
    /// Compile a separator spec.
    pub fn parse(spec: &str) -> Result<Self> {
        if let Some(pattern) = spec.strip_prefix(REGEX_MARKER) {
            let regex = Regex::new(pattern)
                .map_err(|e| Error::SeparatorCompile(format!("{pattern:?}: {e}")))?;
            if regex.find(b"").is_some() {
                return Err(Error::SeparatorCompile(format!(
                    "{pattern:?} matches the empty string"
                )));
            }
            return Ok(Separator::Pattern(regex));
        }

        let literal = unescape(spec)?;
        if literal.is_empty() {
            return Err(Error::SeparatorCompile("separator is empty".into()));
        }
        Ok(Separator::Literal(literal))
    }

    /// Leftmost match within `haystack` as a `(start, end)` pair.
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        match self {
            Separator::Literal(needle) => haystack
                .windows(needle.len())
                .position(|w| w == needle)
                .map(|start| (start, start + needle.len())),
            Separator::Pattern(regex) => regex.find(haystack).map(|m| (m.start(), m.end())),
        }
    }
}

/// Decode standard escapes in a literal separator spec.
fn unescape(spec: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(spec.len());
    let mut chars = spec.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(Error::SeparatorCompile(format!(
                        "truncated \\x escape in {spec:?}"
                    )));
                };
                let byte = u8::from_str_radix(&format!("{hi}{lo}"), 16).map_err(|_| {
                    Error::SeparatorCompile(format!("bad \\x escape in {spec:?}"))
                })?;
                out.push(byte);
            }
            other => {
                return Err(Error::SeparatorCompile(format!(
                    "unknown escape \\{} in {spec:?}",
                    other.map_or(String::new(), String::from)
                )));
            }
        }
    }
    Ok(out)
}
