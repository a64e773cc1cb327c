use crate::error::{Error, Result};
use crate::logging::ElectionEvent;
use crate::model::{
    db::{vote::NewVote, voter::Voter},
    mongodb::Id,
};

use super::{finalists, Election, Winner, DECIDING_STAGE, FINAL_STAGE};

impl Election {
    /// Let the arbiter settle an unresolved stage-2 tie directly.
    ///
    /// Every vote of `stage` (2 or 3) in the active session is replaced by a
    /// single 1-point vote for `winner_id` in the arbiter's name. Only allowed
    /// while the winner cannot otherwise be decided, and only for one of the
    /// tied leaders.
    pub async fn resolve_tie(&self, arbiter: &Voter, stage: u32, winner_id: Id) -> Result<Winner> {
        if !arbiter.is_arbiter || !arbiter.is_eligible_voter() {
            return Err(Error::ArbiterRequired);
        }
        if stage != DECIDING_STAGE && stage != FINAL_STAGE {
            return Err(Error::InvalidStage(stage));
        }

        let session = self.active_session().await?;
        let _guard = self.locks.lock(session.id).await;
        let session = self.still_active(session.id).await?;

        match self.winner(&session).await {
            Err(Error::TieUnresolved) => {}
            Ok(_) | Err(Error::VotingIncomplete | Error::NoStage2Votes) => {
                return Err(Error::NoTieToResolve)
            }
            Err(err) => return Err(err),
        }

        if self.store.candidate(winner_id).await?.is_none() {
            return Err(Error::CandidateNotFound(winner_id.into()));
        }
        let scores = self.stage_scores(session.id, DECIDING_STAGE).await?;
        let leaders = finalists(&scores, FINAL_STAGE)?;
        if !leaders.iter().any(|score| score.candidate_id == winner_id) {
            return Err(Error::CandidateNotEligible {
                candidate: winner_id.into(),
                stage,
            });
        }

        self.store
            .replace_stage_votes(NewVote {
                voter_id: arbiter.id,
                candidate_id: winner_id,
                session_id: session.id,
                stage,
                points: 1,
            })
            .await?;
        ElectionEvent::TieOverridden {
            arbiter: &arbiter.username,
            candidate: winner_id,
            stage,
            session: &session.name,
        }
        .log();

        self.winner(&session).await
    }
}
