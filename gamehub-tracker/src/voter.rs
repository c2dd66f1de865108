//! Anonymous voter identities, and the client-held hint of what they voted for.

use std::fmt;

use chrono::Utc;
use uuid::Uuid;

use crate::{util::random_string, PrimaryKey};

/// Cookie holding the voter identifier
pub const VOTER_COOKIE: &str = "gamehub_voter_id";
/// Cookie holding the [VotedCache]
pub const VOTED_COOKIE: &str = "gamehub_upvoted";
pub const VOTER_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// A stable, anonymous identifier for a browser.
/// It's not tied to an account and is only used to deduplicate votes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoterId(String);

/// The voter behind a request, and whether the identifier was just minted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterIdentity {
    pub id: VoterId,
    /// True if the client didn't send a usable identifier, so it must be stored
    pub fresh: bool,
}

impl VoterId {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 128;
    const SUFFIX_LENGTH: usize = 9;

    /// Parses a voter identifier, returning [None] if it's unusable.
    /// An empty identity means voting is unavailable for the caller.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        let usable = (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&value.len())
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        usable.then(|| Self(value.to_string()))
    }

    /// Mints a new identifier: a time based prefix and a random suffix
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;

        Self(format!(
            "{}-{}",
            to_base36(millis),
            random_string(Self::SUFFIX_LENGTH)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the voter identified by the cookie value, or a new one if it's missing or malformed
pub fn get_or_create_voter(cookie_value: Option<&str>) -> VoterIdentity {
    match cookie_value.and_then(VoterId::parse) {
        Some(id) => VoterIdentity { id, fresh: false },
        None => VoterIdentity {
            id: VoterId::generate(),
            fresh: true,
        },
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut result = Vec::new();

    while value > 0 {
        result.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }

    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// The requests a client believes it has voted for.
///
/// This is only a hint so the UI can react before the server answers.
/// The vote table is the only authority on whether a vote exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotedCache {
    ids: Vec<PrimaryKey>,
}

impl VotedCache {
    /// Keeps the cookie well below browser size limits
    const MAX_ENTRIES: usize = 100;

    /// Reads the cache from its cookie value.
    /// Missing or corrupt values read as an empty cache.
    pub fn from_cookie(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        let ids: Result<Vec<_>, _> = value.split('.').map(Uuid::parse_str).collect();

        match ids {
            Ok(ids) => {
                let mut cache = Self::default();
                ids.into_iter().for_each(|id| cache.mark_voted(id));
                cache
            }
            Err(_) => Self::default(),
        }
    }

    pub fn has_voted(&self, request_id: PrimaryKey) -> bool {
        self.ids.contains(&request_id)
    }

    pub fn mark_voted(&mut self, request_id: PrimaryKey) {
        if self.has_voted(request_id) {
            return;
        }

        if self.ids.len() >= Self::MAX_ENTRIES {
            self.ids.remove(0);
        }

        self.ids.push(request_id);
    }

    pub fn unmark_voted(&mut self, request_id: PrimaryKey) {
        self.ids.retain(|id| *id != request_id);
    }

    pub fn to_cookie_value(&self) -> String {
        self.ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}
