use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{api::auth::Rights, mongodb::Id};

/// Most accounts that may hold the arbiter role at once.
pub const MAX_ARBITERS: usize = 1;

/// Core account data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub username: String,
    pub password_hash: String,
    pub rights: Rights,
    /// The arbiter breaks stage-2 ties.
    pub is_arbiter: bool,
}

impl VoterCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A malformed hash can only come from outside the application, so
        // treat it as a failed match.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }

    /// Does this account count towards stage completion?
    pub fn is_eligible_voter(&self) -> bool {
        self.rights == Rights::Voter
    }

    pub fn is_admin(&self) -> bool {
        self.rights == Rights::Admin
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    /// A well-formed hash. Tests that sign in create accounts through the
    /// hashing path instead.
    const EXAMPLE_HASH: &str = "$argon2i$v=19$m=4096,t=2,p=1$VzJlNzBsa0ZUeGFCNVVucA$01vYAqN0vTeqhZEzW7q9PWmrZlXtzQ/Ns7NkCNE2mA0";

    impl VoterCore {
        pub fn example_voter(username: &str) -> Self {
            Self {
                username: username.to_string(),
                password_hash: EXAMPLE_HASH.to_string(),
                rights: Rights::Voter,
                is_arbiter: false,
            }
        }

        pub fn example_arbiter(username: &str) -> Self {
            Self {
                is_arbiter: true,
                ..Self::example_voter(username)
            }
        }

        pub fn example_admin(username: &str) -> Self {
            Self {
                rights: Rights::Admin,
                ..Self::example_voter(username)
            }
        }
    }
}
