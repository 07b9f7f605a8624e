//! Referee identities and the designation name parser.
//!
//! Designation exports list officials as `"M SURNAME Given"` or
//! `"Mme SURNAME Given"`, several per cell separated by `", "`.

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// A referee as spelled in the designation export.
///
/// Ordering is by last name, then first name, which is the order used in
/// every rendered list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefereeId {
    pub last_name: String,
    pub first_name: String,
}

impl RefereeId {
    pub fn new(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        RefereeId {
            last_name: last_name.into(),
            first_name: first_name.into(),
        }
    }
}

impl fmt::Display for RefereeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.last_name, self.first_name)
    }
}

/// An entry of a referee cell that does not look like a designated official.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("referee entry '{0}' does not match 'M[me] SURNAME Given'")]
    Unrecognized(String),
}

lazy_static::lazy_static! {
    // Anchored at the start only; anything after the given name is ignored.
    static ref REFEREE_NAME: Regex =
        Regex::new(r"^M(?:me)? ([A-Z \-']+) ([A-Z][\w \-']+)").unwrap();
}

/// Parse a single `"M[me] SURNAME Given"` entry.
pub fn parse_referee_entry(entry: &str) -> Result<RefereeId, NameError> {
    let caps = REFEREE_NAME
        .captures(entry)
        .ok_or_else(|| NameError::Unrecognized(entry.to_string()))?;
    Ok(RefereeId::new(&caps[1], caps[2].trim_end()))
}

/// Parse a referee cell holding zero or more comma-separated entries.
///
/// Returns one result per non-blank entry, in cell order, so callers can keep
/// the valid names and report the rejected ones.
pub fn parse_referee_names(cell: &str) -> Vec<Result<RefereeId, NameError>> {
    if cell.trim().is_empty() {
        return Vec::new();
    }

    cell.split(", ")
        .filter(|entry| !entry.trim().is_empty())
        .map(parse_referee_entry)
        .collect()
}
