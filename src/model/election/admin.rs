use crate::error::{Error, Result};
use crate::logging::ElectionEvent;
use crate::model::{
    api::{
        auth::{Claims, Rights},
        candidate::CandidateSpec,
        session::SessionSpec,
        voter::VoterSpec,
    },
    db::{
        candidate::{Candidate, NewCandidate},
        session::{NewSession, Session},
        voter::{NewVoter, Voter},
    },
    mongodb::Id,
    store::VoteFilter,
};

use super::Election;

/// `Session_<n>`, where n is one more than both the number of sessions and
/// the highest number already taken by a default name. Deleted sessions leave
/// gaps in the numbering.
pub fn default_session_name(sessions: &[Session]) -> String {
    let highest = sessions
        .iter()
        .filter_map(|session| session.name.strip_prefix("Session_")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let n = highest.max(sessions.len() as u64) + 1;
    format!("Session_{n}")
}

/// Candidates.
impl Election {
    pub async fn add_candidate(&self, spec: CandidateSpec) -> Result<Candidate> {
        let candidate = NewCandidate::from(spec);
        if candidate.name.is_empty() {
            return Err(Error::BadRequest("Candidate name is empty".to_string()));
        }
        let candidate = self.store.insert_candidate(candidate).await?;
        info!("Registered candidate {} ({})", candidate.name, candidate.id);
        Ok(candidate)
    }

    /// Remove a candidate. Refused while any vote, in any session, names it.
    pub async fn remove_candidate(&self, id: Id) -> Result<()> {
        let candidate = self
            .store
            .candidate(id)
            .await?
            .ok_or(Error::CandidateNotFound(id.into()))?;
        let filter = VoteFilter::default().candidate(id);
        if self.store.count_votes(&filter).await? > 0 {
            return Err(Error::InUse(format!(
                "Candidate {} has votes recorded",
                candidate.name
            )));
        }
        self.store.delete_candidate(id).await?;
        info!("Removed candidate {}", candidate.name);
        Ok(())
    }

    pub async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        self.store.candidates().await
    }
}

/// Voters.
impl Election {
    /// Register an account. The store refuses a second arbiter.
    pub async fn add_voter(&self, spec: VoterSpec) -> Result<Voter> {
        let voter = NewVoter::try_from(spec)?;
        let voter = self.store.insert_voter(voter).await?;
        info!(
            "Registered {} {}{}",
            voter.rights,
            voter.username,
            if voter.is_arbiter { " as arbiter" } else { "" }
        );
        Ok(voter)
    }

    /// Remove an account. Refused for the last administrator, and for voters
    /// with votes in the active session.
    pub async fn remove_voter(&self, id: Id) -> Result<()> {
        let voter = self
            .store
            .voter(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Voter {id}")))?;

        if voter.is_admin() && self.store.count_voters(Rights::Admin).await? <= 1 {
            return Err(Error::InUse(format!(
                "{} is the last administrator",
                voter.username
            )));
        }
        if let Some(session) = self.store.active_session().await? {
            let filter = VoteFilter::session(session.id).voter(id);
            if self.store.count_votes(&filter).await? > 0 {
                return Err(Error::InUse(format!(
                    "{} has voted in {}",
                    voter.username, session.name
                )));
            }
        }

        self.store.delete_voter(id).await?;
        info!("Removed {} {}", voter.rights, voter.username);
        Ok(())
    }

    pub async fn list_voters(&self) -> Result<Vec<Voter>> {
        self.store.voters().await
    }

    /// Create the bootstrap administrator if there are no administrators.
    pub async fn ensure_admin_exists(&self, username: &str, password: &str) -> Result<()> {
        if self.store.count_voters(Rights::Admin).await? > 0 {
            return Ok(());
        }
        let spec = VoterSpec {
            username: username.to_string(),
            password: password.to_string(),
            is_admin: true,
            is_arbiter: false,
        };
        self.add_voter(spec).await?;
        warn!("No administrator found, created {username} from config");
        Ok(())
    }
}

/// Authentication.
impl Election {
    /// Check a username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Voter> {
        let voter = self
            .store
            .voter_by_username(username)
            .await?
            .filter(|voter| voter.verify_password(password))
            .ok_or(Error::AuthFailure)?;
        debug!("{} signed in", voter.username);
        Ok(voter)
    }

    /// The account a verified token belongs to, as currently stored.
    pub async fn current_voter(&self, claims: &Claims) -> Result<Voter> {
        self.store
            .voter(claims.id)
            .await?
            .ok_or(Error::InvalidToken)
    }
}

/// Sessions.
impl Election {
    /// Start a new session at stage 1, named by [`default_session_name`]
    /// unless a name is given.
    pub async fn start_session(&self, spec: SessionSpec) -> Result<Session> {
        let name = match spec.name.map(|name| name.trim().to_string()) {
            Some(name) if !name.is_empty() => name,
            _ => default_session_name(&self.store.sessions().await?),
        };
        let session = self
            .store
            .insert_session(NewSession::new(name, spec.description))
            .await?;
        ElectionEvent::SessionStarted {
            session: &session.name,
            id: session.id,
        }
        .log();
        Ok(session)
    }

    /// Close the active session. Its votes stay readable.
    pub async fn end_session(&self) -> Result<Session> {
        let session = self.active_session().await?;
        let _guard = self.locks.lock(session.id).await;
        if !self.store.deactivate_session(session.id).await? {
            return Err(Error::NoActiveSession);
        }
        ElectionEvent::SessionEnded {
            session: &session.name,
            stage: session.stage,
        }
        .log();
        self.store
            .session(session.id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Session {}", session.id)))
    }

    /// Delete a session and every vote cast in it.
    pub async fn delete_session(&self, id: Id) -> Result<()> {
        let guard = self.locks.lock(id).await;
        if !self.store.delete_session(id).await? {
            return Err(Error::not_found(format!("Session {id}")));
        }
        drop(guard);
        self.locks.forget(id).await;
        ElectionEvent::SessionDeleted { id }.log();
        Ok(())
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.store.sessions().await
    }

    pub async fn current_session(&self) -> Result<Session> {
        self.active_session().await
    }
}
