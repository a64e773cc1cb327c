use std::fmt::Display;

use mongodb::bson::Bson;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    /// Casts votes and counts towards stage completion.
    Voter = 0,
    /// Manages candidates, voters and sessions. Never votes.
    Admin = 1,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

impl From<Rights> for Bson {
    fn from(rights: Rights) -> Self {
        Bson::Int32(i32::from(rights as u8))
    }
}

/// A class of accounts an endpoint accepts.
pub trait Role: Send + Sync + 'static {
    /// Does an account with the given rights belong to this class?
    fn permits(rights: Rights) -> bool;
}

/// Any signed-in account.
pub struct AnyRights;

/// Accounts that vote.
pub struct VoterRights;

/// Administrators.
pub struct AdminRights;

impl Role for AnyRights {
    fn permits(_rights: Rights) -> bool {
        true
    }
}

impl Role for VoterRights {
    fn permits(rights: Rights) -> bool {
        rights == Rights::Voter
    }
}

impl Role for AdminRights {
    fn permits(rights: Rights) -> bool {
        rights == Rights::Admin
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::to_bson;

    use super::*;

    #[test]
    fn bson_matches_serialized_form() {
        for rights in [Rights::Voter, Rights::Admin] {
            assert_eq!(Bson::from(rights), to_bson(&rights).unwrap());
        }
    }

    #[test]
    fn roles_partition_rights() {
        assert!(VoterRights::permits(Rights::Voter));
        assert!(!VoterRights::permits(Rights::Admin));
        assert!(AdminRights::permits(Rights::Admin));
        assert!(!AdminRights::permits(Rights::Voter));
        assert!(AnyRights::permits(Rights::Voter));
    }
}
