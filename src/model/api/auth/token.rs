use std::marker::PhantomData;
use std::ops::Deref;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{db::voter::Voter, election::Election, mongodb::Id};

use super::user::{Rights, Role};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// JWT claims identifying a signed-in account.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Id,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Claims {
    /// Claims for the given account, expiring after the configured TTL.
    pub fn new(voter: &Voter, config: &Config) -> Self {
        Self {
            id: voter.id,
            rights: voter.rights,
            expire_at: Utc::now() + config.auth_ttl(),
        }
    }

    /// Sign these claims into a token.
    pub fn encode(&self, config: &Config) -> Result<String> {
        Ok(jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?)
    }

    /// Verify a token's signature and expiry and extract its claims.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        jsonwebtoken::decode::<Self>(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| Error::InvalidToken)
    }
}

/// The cookie carrying a signed token.
pub fn auth_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build(AUTH_TOKEN_COOKIE, token)
        .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish()
}

/// Pull the raw token out of the auth cookie, or failing that an
/// `Authorization: Bearer` header.
fn raw_token(req: &Request<'_>) -> Option<String> {
    if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Request guard for a signed-in account of role `R`. Holds the account as
/// currently stored, so removed accounts are locked out immediately.
pub struct AuthToken<R> {
    pub voter: Voter,
    role: PhantomData<R>,
}

impl<R> AuthToken<R> {
    pub fn into_inner(self) -> Voter {
        self.voter
    }
}

impl<R> Deref for AuthToken<R> {
    type Target = Voter;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

#[rocket::async_trait]
impl<'r, R: Role> FromRequest<'r> for AuthToken<R> {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwraps are safe as both are always managed.
        let config = req.rocket().state::<Config>().unwrap();
        let election = req.rocket().state::<Election>().unwrap();

        let Some(token) = raw_token(req) else {
            return Outcome::Failure((Status::Unauthorized, Error::InvalidToken));
        };
        let claims = match Claims::decode(&token, config) {
            Ok(claims) => claims,
            Err(err) => return Outcome::Failure((Status::Unauthorized, err)),
        };
        if !R::permits(claims.rights) {
            return Outcome::Failure((Status::Forbidden, Error::InsufficientRights));
        }

        match election.current_voter(&claims).await {
            Ok(voter) => Outcome::Success(Self {
                voter,
                role: PhantomData,
            }),
            Err(err) => Outcome::Failure((err.status(), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::model::db::voter::VoterCore;

    fn voter() -> Voter {
        Voter {
            id: Id::new(),
            voter: VoterCore::example_voter("someone"),
        }
    }

    #[test]
    fn tokens_round_trip() {
        let config = Config::example();
        let voter = voter();
        let token = Claims::new(&voter, &config).encode(&config).unwrap();
        let claims = Claims::decode(&token, &config).unwrap();
        assert_eq!(claims.id, voter.id);
        assert_eq!(claims.rights, Rights::Voter);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = Config::example();
        let mut claims = Claims::new(&voter(), &config);
        claims.expire_at = Utc::now() - ChronoDuration::hours(1);
        let token = claims.encode(&config).unwrap();
        assert!(matches!(
            Claims::decode(&token, &config),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn foreign_signatures_are_rejected() {
        let config = Config::example();
        let token = Claims::new(&voter(), &config).encode(&config).unwrap();
        let other = Config::example_with_secret("a different secret");
        assert!(matches!(
            Claims::decode(&token, &other),
            Err(Error::InvalidToken)
        ));
    }
}
