//! The election state machine.
//!
//! A session runs through up to three stages:
//!
//! 1. Every eligible voter ranks three distinct candidates, worth 3, 2 and 1
//!    points in the order they are cast.
//! 2. Every eligible voter picks one of the stage-1 finalists for 1 point.
//! 3. If stage 2 ended level at the top, the arbiter casts the deciding vote.
//!
//! Stages advance by themselves when the last expected vote of a stage lands.
//! All derived state (scores, winner, status) is recomputed from the stored
//! votes on every query.

mod admin;
mod advancement;
#[cfg(test)]
pub mod examples;
mod gate;
mod locks;
mod report;
mod scoring;
mod tie;

use std::sync::Arc;

pub use advancement::StageProgress;
pub use gate::VoteReceipt;
pub use locks::SessionLocks;
pub use report::{headline, Standing, VotingStatus, Winner};
pub use scoring::{finalists, is_tie, tally, Score};

use crate::error::{Error, Result};
use crate::model::{
    db::session::{Session, FIRST_STAGE},
    mongodb::Id,
    store::Store,
};

/// The last stage. Sessions never advance past it.
pub const FINAL_STAGE: u32 = 3;

/// The stage whose scores decide the winner.
pub const DECIDING_STAGE: u32 = 2;

/// Number of candidates that go through to the next stage, before ties.
pub const FINALISTS: usize = 2;

/// Is `stage` one of the stages votes can be cast in?
pub fn is_voting_stage(stage: u32) -> bool {
    (FIRST_STAGE..=FINAL_STAGE).contains(&stage)
}

/// How many votes each voter casts in `stage`.
pub fn vote_limit(stage: u32) -> u32 {
    if stage == FIRST_STAGE {
        3
    } else {
        1
    }
}

/// Points carried by a voter's next vote in `stage`, given how many they have
/// already cast there.
pub fn points_for(stage: u32, prior_votes: u32) -> u32 {
    if stage == FIRST_STAGE {
        vote_limit(stage).saturating_sub(prior_votes)
    } else {
        1
    }
}

/// Handle on the election engine. Cheap to clone; clones share the store and
/// the session locks.
#[derive(Clone)]
pub struct Election {
    store: Arc<dyn Store>,
    locks: Arc<SessionLocks>,
}

impl Election {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Arc::new(SessionLocks::new()),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// The currently active session.
    pub async fn active_session(&self) -> Result<Session> {
        self.store
            .active_session()
            .await?
            .ok_or(Error::NoActiveSession)
    }

    /// The given session, or the active one if none is given.
    pub async fn session_or_active(&self, session_id: Option<Id>) -> Result<Session> {
        match session_id {
            Some(id) => self
                .store
                .session(id)
                .await?
                .ok_or_else(|| Error::not_found(format!("Session {id}"))),
            None => self.active_session().await,
        }
    }

    /// Re-read a session after taking its lock. It must still be active.
    async fn still_active(&self, id: Id) -> Result<Session> {
        match self.store.session(id).await? {
            Some(session) if session.active => Ok(session),
            _ => Err(Error::NoActiveSession),
        }
    }
}
