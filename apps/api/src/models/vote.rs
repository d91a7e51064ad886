//! Vote model
//!
//! One row per (profile, track) pair with a signed value; the pair is the
//! primary key, so the at-most-one-vote invariant lives in the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Signed vote value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// The stored SMALLINT representation (+1 / -1)
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(format!("vote value must be 1 or -1, got {other}")),
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.as_i16()
    }
}

/// Vote record from the votes table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vote {
    /// Voting profile
    pub profile_id: Uuid,

    /// Target track
    pub track_id: Uuid,

    /// Signed value, +1 or -1
    pub value: i16,

    /// First vote timestamp
    pub created_at: DateTime<Utc>,

    /// Last change timestamp
    pub updated_at: DateTime<Utc>,
}

/// Result of a toggle operation plus the track's aggregate score
#[derive(Debug, Clone, Serialize)]
pub struct VoteStatus {
    /// The caller's vote after the operation (None after toggle-off)
    pub my_vote: Option<i16>,

    /// Sum of all vote values for the track
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_value_conversions() {
        assert_eq!(VoteValue::Up.as_i16(), 1);
        assert_eq!(VoteValue::Down.as_i16(), -1);
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        assert!(VoteValue::try_from(0).is_err());
        assert!(VoteValue::try_from(2).is_err());
    }

    #[test]
    fn test_vote_value_serde() {
        assert_eq!(serde_json::to_string(&VoteValue::Up).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<VoteValue>("-1").unwrap(),
            VoteValue::Down
        );
        assert!(serde_json::from_str::<VoteValue>("3").is_err());
    }
}
