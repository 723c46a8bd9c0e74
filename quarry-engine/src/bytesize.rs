//! Size syntax: integer with optional K/KB, M/MB, G/GB suffix
//!
//! A bare integer means kibibytes, matching the operator interface for the
//! read chunk size and the fixture target size.

use crate::{Error, Result};

const KIB: u64 = 1024;

/// Parse a size like `64`, `64K`, `8MB`, `2gb`. Missing suffix is KiB.
pub fn parse_size(spec: &str) -> Result<u64> {
    let trimmed = spec.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(Error::InvalidSize(format!("{spec:?} has no leading integer")));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidSize(format!("{spec:?} is out of range")))?;

    let multiplier = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "K" | "KB" => KIB,
        "M" | "MB" => KIB * KIB,
        "G" | "GB" => KIB * KIB * KIB,
        other => {
            return Err(Error::InvalidSize(format!(
                "unknown suffix {other:?} in {spec:?}"
            )));
        }
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidSize(format!("{spec:?} overflows")))
}
