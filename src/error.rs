use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{status::Custom, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::{api::id::ApiId, mongodb::is_transient};

pub type Result<T> = std::result::Result<T, Error>;

/// Every way an operation can fail.
///
/// Business-rule violations are reported straight back to the caller and are
/// never retried. Only transient store faults are retried, and those that
/// persist become [`Error::StoreUnavailable`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("No voting session is active")]
    NoActiveSession,
    #[error("Stage {0} is not open for voting")]
    InvalidStage(u32),
    #[error("Vote limit of {limit} reached for stage {stage}")]
    VoteLimitExceeded { stage: u32, limit: u32 },
    #[error("Candidate {0} not found")]
    CandidateNotFound(ApiId),
    #[error("Already voted for candidate {0} in this stage")]
    DuplicateCandidateVote(ApiId),
    #[error("Voting has not reached the final stage yet")]
    VotingIncomplete,
    #[error("No votes were cast in stage 2")]
    NoStage2Votes,
    #[error("Stage 2 ended in a tie that the arbiter has not broken yet")]
    TieUnresolved,
    #[error("Only the arbiter may do this")]
    ArbiterRequired,
    #[error("Incorrect username or password")]
    AuthFailure,
    #[error("Missing, expired or invalid authentication token")]
    InvalidToken,
    #[error("This account may not do this")]
    InsufficientRights,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Stage {0} needs at least two scored candidates to pick finalists")]
    InsufficientCandidates(u32),
    #[error("Candidate {candidate} is not eligible in stage {stage}")]
    CandidateNotEligible { candidate: ApiId, stage: u32 },
    #[error("Only eligible voters may vote")]
    VoterNotEligible,
    #[error("There is no unresolved tie to break")]
    NoTieToResolve,
    #[error("A voting session is already active")]
    SessionAlreadyActive,
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Still in use: {0}")]
    InUse(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Is this a store fault worth retrying?
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Db(err) => is_transient(err),
            _ => false,
        }
    }

    /// The stable name of this error kind, as reported to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoActiveSession => "NoActiveSession",
            Self::InvalidStage(_) => "InvalidStage",
            Self::VoteLimitExceeded { .. } => "VoteLimitExceeded",
            Self::CandidateNotFound(_) => "CandidateNotFound",
            Self::DuplicateCandidateVote(_) => "DuplicateCandidateVote",
            Self::VotingIncomplete => "VotingIncomplete",
            Self::NoStage2Votes => "NoStage2Votes",
            Self::TieUnresolved => "TieUnresolved",
            Self::ArbiterRequired => "ArbiterRequired",
            Self::AuthFailure => "AuthFailure",
            Self::InvalidToken => "InvalidToken",
            Self::InsufficientRights => "InsufficientRights",
            Self::NotFound(_) => "NotFound",
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::Db(_) => "StoreError",
            Self::InsufficientCandidates(_) => "InsufficientCandidates",
            Self::CandidateNotEligible { .. } => "CandidateNotEligible",
            Self::VoterNotEligible => "VoterNotEligible",
            Self::NoTieToResolve => "NoTieToResolve",
            Self::SessionAlreadyActive => "SessionAlreadyActive",
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::InUse(_) => "InUse",
            Self::BadRequest(_) | Self::Argon2(_) => "BadRequest",
            Self::Jwt(_) => "InvalidToken",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::InvalidStage(_)
            | Self::CandidateNotEligible { .. }
            | Self::BadRequest(_)
            | Self::AlreadyExists(_)
            | Self::SessionAlreadyActive
            | Self::Argon2(_) => Status::BadRequest,
            Self::AuthFailure | Self::InvalidToken | Self::Jwt(_) => Status::Unauthorized,
            Self::ArbiterRequired | Self::VoterNotEligible | Self::InsufficientRights => {
                Status::Forbidden
            }
            Self::CandidateNotFound(_) | Self::NotFound(_) => Status::NotFound,
            Self::NoActiveSession
            | Self::VoteLimitExceeded { .. }
            | Self::DuplicateCandidateVote(_)
            | Self::VotingIncomplete
            | Self::NoStage2Votes
            | Self::TieUnresolved
            | Self::InsufficientCandidates(_)
            | Self::NoTieToResolve => Status::Conflict,
            Self::InUse(_) => Status::UnprocessableEntity,
            Self::StoreUnavailable(_) => Status::ServiceUnavailable,
            Self::Db(_) => Status::InternalServerError,
        }
    }
}

/// JSON body sent alongside an error status.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        Custom(status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(Error::NoActiveSession.status(), Status::Conflict);
        assert_eq!(Error::InvalidStage(4).status(), Status::BadRequest);
        assert_eq!(Error::ArbiterRequired.status(), Status::Forbidden);
        assert_eq!(Error::AuthFailure.status(), Status::Unauthorized);
        assert_eq!(
            Error::StoreUnavailable("down".into()).status(),
            Status::ServiceUnavailable
        );
        assert!(!Error::TieUnresolved.is_transient());
    }

    #[test]
    fn permanent_store_faults_are_not_reported_as_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::Db(DbError::from(io));
        assert_eq!(err.kind(), "StoreError");
        assert_eq!(err.status(), Status::InternalServerError);

        let unavailable = Error::StoreUnavailable("gave up after 3 attempts".into());
        assert_eq!(unavailable.kind(), "StoreUnavailable");
        assert_eq!(unavailable.status(), Status::ServiceUnavailable);
    }

    #[test]
    fn kinds_are_stable_names() {
        let err = Error::VoteLimitExceeded { stage: 1, limit: 3 };
        assert_eq!(err.kind(), "VoteLimitExceeded");
        assert_eq!(err.to_string(), "Vote limit of 3 reached for stage 1");
    }
}
