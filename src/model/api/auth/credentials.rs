use serde::{Deserialize, Serialize};

use crate::model::api::voter::VoterDescription;

/// Raw sign-in credentials, received from a user. Never stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Sent back after a successful sign-in. The same token is also set as the
/// auth cookie, so browser clients can ignore the body.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub voter: VoterDescription,
}

impl LoginResponse {
    pub fn bearer(access_token: String, voter: VoterDescription) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            voter,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl Credentials {
        pub fn example_admin() -> Self {
            Self {
                username: "coordinator".into(),
                password: "runoff4lyfe".into(),
            }
        }

        pub fn example_voter() -> Self {
            Self {
                username: "member-one".into(),
                password: "correcthorse".into(),
            }
        }

        pub fn example_arbiter() -> Self {
            Self {
                username: "the-president".into(),
                password: "castingvote".into(),
            }
        }
    }
}
