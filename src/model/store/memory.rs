use std::collections::BTreeMap;
use std::sync::Arc;

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    api::auth::Rights,
    db::{
        candidate::{Candidate, NewCandidate},
        session::{NewSession, Session},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter, MAX_ARBITERS},
    },
    mongodb::Id,
};

use super::{Store, VoteFilter};

#[derive(Default)]
struct Tables {
    voters: BTreeMap<Id, Voter>,
    candidates: BTreeMap<Id, Candidate>,
    sessions: BTreeMap<Id, Session>,
    votes: BTreeMap<Id, Vote>,
}

/// A [`Store`] that keeps everything in process memory.
///
/// All tables sit behind one lock, so every method is trivially atomic. The
/// same uniqueness rules as the MongoDB indexes are enforced by hand.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, empty store ready to hand to the election engine.
    pub fn shared() -> Arc<dyn Store> {
        Arc::new(Self::new())
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter> {
        let mut tables = self.tables.write().await;
        if tables.voters.values().any(|v| v.username == voter.username) {
            return Err(Error::AlreadyExists(format!("Voter {}", voter.username)));
        }
        let arbiters = tables.voters.values().filter(|v| v.is_arbiter).count();
        if voter.is_arbiter && arbiters >= MAX_ARBITERS {
            return Err(Error::AlreadyExists("An arbiter".to_string()));
        }
        let voter = Voter {
            id: Id::new(),
            voter,
        };
        tables.voters.insert(voter.id, voter.clone());
        Ok(voter)
    }

    async fn voter(&self, id: Id) -> Result<Option<Voter>> {
        Ok(self.tables.read().await.voters.get(&id).cloned())
    }

    async fn voter_by_username(&self, username: &str) -> Result<Option<Voter>> {
        let tables = self.tables.read().await;
        Ok(tables
            .voters
            .values()
            .find(|v| v.username == username)
            .cloned())
    }

    async fn voters(&self) -> Result<Vec<Voter>> {
        Ok(self.tables.read().await.voters.values().cloned().collect())
    }

    async fn count_voters(&self, rights: Rights) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.voters.values().filter(|v| v.rights == rights).count() as u64)
    }

    async fn delete_voter(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.voters.remove(&id).is_some())
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        if tables.candidates.values().any(|c| c.name == candidate.name) {
            return Err(Error::AlreadyExists(format!("Candidate {}", candidate.name)));
        }
        let candidate = Candidate {
            id: Id::new(),
            candidate,
        };
        tables.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.tables.read().await.candidates.get(&id).cloned())
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.tables.read().await.candidates.values().cloned().collect())
    }

    async fn delete_candidate(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.candidates.remove(&id).is_some())
    }

    async fn insert_session(&self, session: NewSession) -> Result<Session> {
        let mut tables = self.tables.write().await;
        if session.active && tables.sessions.values().any(|s| s.active) {
            return Err(Error::SessionAlreadyActive);
        }
        if tables.sessions.values().any(|s| s.name == session.name) {
            return Err(Error::AlreadyExists(format!("Session {}", session.name)));
        }
        let session = Session {
            id: Id::new(),
            session,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn session(&self, id: Id) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn active_session(&self) -> Result<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.values().find(|s| s.active).cloned())
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.tables.read().await.sessions.values().cloned().collect())
    }

    async fn deactivate_session(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get_mut(&id) {
            Some(session) if session.active => {
                session.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_session(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.votes.retain(|_, vote| vote.session_id != id);
        Ok(true)
    }

    async fn votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .filter(|vote| filter.matches(vote))
            .cloned()
            .collect())
    }

    async fn count_votes(&self, filter: &VoteFilter) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.votes.values().filter(|v| filter.matches(v)).count() as u64)
    }

    async fn commit_vote(&self, vote: NewVote, advance_from: Option<u32>) -> Result<Vote> {
        let mut tables = self.tables.write().await;

        // Same key as the unique vote index in MongoDB.
        let key = VoteFilter::stage(vote.session_id, vote.stage)
            .voter(vote.voter_id)
            .candidate(vote.candidate_id);
        if tables.votes.values().any(|v| key.matches(v)) {
            return Err(Error::DuplicateCandidateVote(vote.candidate_id.into()));
        }

        // Check the stage bump can apply before writing anything.
        if let Some(from) = advance_from {
            let session = tables
                .sessions
                .get(&vote.session_id)
                .ok_or_else(|| Error::not_found(format!("Session {}", vote.session_id)))?;
            if session.stage != from {
                return Err(Error::InvalidStage(from));
            }
        }

        let vote = Vote {
            id: Id::new(),
            vote,
        };
        tables.votes.insert(vote.id, vote.clone());
        if advance_from.is_some() {
            if let Some(session) = tables.sessions.get_mut(&vote.session_id) {
                session.stage += 1;
            }
        }
        Ok(vote)
    }

    async fn replace_stage_votes(&self, vote: NewVote) -> Result<Vote> {
        let mut tables = self.tables.write().await;
        let stage = VoteFilter::stage(vote.session_id, vote.stage);
        tables.votes.retain(|_, v| !stage.matches(v));
        let vote = Vote {
            id: Id::new(),
            vote,
        };
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }
}
