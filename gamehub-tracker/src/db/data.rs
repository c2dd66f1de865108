use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type used for primary keys in the database.
pub type PrimaryKey = Uuid;

/// A request for a game to be added to the shared library
#[derive(Debug, Clone, PartialEq)]
pub struct GameRequestData {
    pub id: PrimaryKey,
    pub created_at: DateTime<Utc>,
    /// Display name of whoever submitted the request
    pub requester: String,
    pub game_title: String,
    pub game_image: Option<String>,
    /// The id of the game in the external catalog, if it was requested from there
    pub catalog_id: Option<i64>,
    pub console: Console,
    pub status: RequestStatus,
    /// Only meaningful when the status is [RequestStatus::Rejected]
    pub rejection_reason: Option<String>,
    /// Only meaningful when the status is [RequestStatus::Approved]
    pub available: bool,
    /// Denormalized vote count, only ever changed by the upvote ledger
    pub upvotes: u32,
}

/// The moderation state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A platform that games can be requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Console {
    #[serde(rename = "PS5")]
    Ps5,
    #[serde(rename = "Nintendo Switch")]
    NintendoSwitch,
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "Xbox One")]
    XboxOne,
    #[serde(rename = "Xbox Series X")]
    XboxSeriesX,
    #[serde(rename = "PC")]
    Pc,
}

/// The result of casting or removing an upvote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// True if the vote was recorded (or removed) by this call
    pub success: bool,
    /// True if the voter had already voted for the request
    pub already_voted: bool,
    /// The counter value after the operation
    pub new_count: u32,
}

/// Reasons suggested to admins when rejecting a request.
/// Any other text is accepted as well.
pub const REJECTION_REASONS: [&str; 6] = [
    "Over budget",
    "Age rating too high",
    "Already own similar title",
    "Not suitable for office",
    "Out of stock / Unavailable",
    "Other",
];

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant("status", s.to_string()))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Console {
    pub const ALL: [Console; 6] = [
        Self::Ps5,
        Self::NintendoSwitch,
        Self::Ps4,
        Self::XboxOne,
        Self::XboxSeriesX,
        Self::Pc,
    ];

    /// Consoles shown in catalog filters when nothing is configured
    pub const DEFAULT_ENABLED: [Console; 2] = [Self::Ps5, Self::NintendoSwitch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ps5 => "PS5",
            Self::NintendoSwitch => "Nintendo Switch",
            Self::Ps4 => "PS4",
            Self::XboxOne => "Xbox One",
            Self::XboxSeriesX => "Xbox Series X",
            Self::Pc => "PC",
        }
    }

    /// The platform id the external catalog uses for this console
    pub fn catalog_platform_id(&self) -> u32 {
        match self {
            Self::Ps5 => 18,
            Self::NintendoSwitch => 7,
            Self::Ps4 => 16,
            Self::XboxOne => 1,
            Self::XboxSeriesX => 186,
            Self::Pc => 4,
        }
    }

    pub fn from_catalog_platform_id(id: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|console| console.catalog_platform_id() == id)
    }

    /// Maps a platform name as reported by the catalog to a console.
    /// Older generations fold into their successor; handhelds, mobile and web return [None].
    pub fn from_platform_name(name: &str) -> Option<Self> {
        let console = match name {
            "PlayStation 5" | "PS5" => Self::Ps5,
            "PlayStation 4" | "PS4" | "PlayStation 3" | "PS3" => Self::Ps4,
            "Xbox Series S/X" | "Xbox Series X|S" | "Xbox Series X" | "Xbox Series S" => {
                Self::XboxSeriesX
            }
            "Xbox One" | "Xbox One S" | "Xbox One X" | "Xbox 360" | "Xbox" => Self::XboxOne,
            "PC" | "Microsoft Windows" | "Windows" | "Linux" | "macOS" | "Mac"
            | "Apple Macintosh" | "Classic Macintosh" | "Macintosh" | "SteamOS" | "Steam OS"
            | "OS X" => Self::Pc,
            "Nintendo Switch" | "Switch" => Self::NintendoSwitch,
            _ => return None,
        };

        Some(console)
    }
}

impl FromStr for Console {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|console| console.as_str() == s)
            .ok_or_else(|| UnknownVariant("console", s.to_string()))
    }
}

impl fmt::Display for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string didn't match any known variant of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {0}: {1}")]
pub struct UnknownVariant(pub &'static str, pub String);
