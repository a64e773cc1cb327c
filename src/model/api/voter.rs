use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    api::{auth::Rights, id::ApiId},
    db::voter::{NewVoter, Voter},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A request to register an account. The password is plaintext and is
/// hashed before anything is stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct VoterSpec {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_arbiter: bool,
}

impl TryFrom<VoterSpec> for NewVoter {
    type Error = Error;

    /// Hash the password. The username must be non-empty and the password at
    /// least [`MIN_PASSWORD_LENGTH`] characters.
    fn try_from(spec: VoterSpec) -> Result<Self, Self::Error> {
        let username = spec.username.trim();
        if username.is_empty() || spec.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::BadRequest("Illegal voter credentials".to_string()));
        }
        if spec.is_admin && spec.is_arbiter {
            return Err(Error::BadRequest(
                "An administrator cannot be the arbiter".to_string(),
            ));
        }

        // 16 bytes is the recommended salt length for Argon2.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(spec.password.as_bytes(), &salt, &Config::default())?;

        Ok(Self {
            username: username.to_string(),
            password_hash,
            rights: if spec.is_admin {
                Rights::Admin
            } else {
                Rights::Voter
            },
            is_arbiter: spec.is_arbiter,
        })
    }
}

/// An account, as shown to API clients. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDescription {
    pub id: ApiId,
    pub username: String,
    pub rights: Rights,
    pub is_arbiter: bool,
}

impl From<Voter> for VoterDescription {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id.into(),
            username: voter.voter.username,
            rights: voter.voter.rights,
            is_arbiter: voter.voter.is_arbiter,
        }
    }
}
