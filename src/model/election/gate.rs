use crate::error::{Error, Result};
use crate::logging::ElectionEvent;
use crate::model::{
    api::auth::Rights,
    db::{
        session::FIRST_STAGE,
        vote::{NewVote, Vote},
        voter::Voter,
    },
    mongodb::Id,
    store::VoteFilter,
};

use super::{
    is_tie, is_voting_stage, points_for, vote_limit, Election, StageProgress, DECIDING_STAGE,
    FINAL_STAGE,
};

/// The outcome of a successful vote.
#[derive(Debug, Clone)]
pub struct VoteReceipt {
    pub vote: Vote,
    /// The session's stage once the vote was recorded.
    pub current_stage: u32,
    /// Did this vote complete its stage?
    pub stage_advanced: bool,
}

impl Election {
    /// Cast one vote for `candidate_id` in `stage` of the active session.
    ///
    /// Checks run in a fixed order and the first failure is returned. If the
    /// vote is the last one its stage expects, the session moves to the next
    /// stage in the same write.
    pub async fn cast_vote(&self, voter: &Voter, candidate_id: Id, stage: u32) -> Result<VoteReceipt> {
        if voter.rights != Rights::Voter {
            return Err(Error::VoterNotEligible);
        }

        let session = self.active_session().await?;
        let _guard = self.locks.lock(session.id).await;
        let session = self.still_active(session.id).await?;

        if !is_voting_stage(stage) || stage != session.stage {
            return Err(Error::InvalidStage(stage));
        }
        if stage == FINAL_STAGE {
            if !voter.is_arbiter {
                return Err(Error::ArbiterRequired);
            }
            if !is_tie(&self.stage_scores(session.id, DECIDING_STAGE).await?) {
                return Err(Error::NoTieToResolve);
            }
        }

        let stage_votes = self
            .store
            .votes(&VoteFilter::stage(session.id, stage))
            .await?;
        let mine: Vec<&Vote> = stage_votes
            .iter()
            .filter(|vote| vote.voter_id == voter.id)
            .collect();
        let prior = mine.len() as u32;
        let limit = vote_limit(stage);
        if prior >= limit {
            return Err(Error::VoteLimitExceeded { stage, limit });
        }

        if self.store.candidate(candidate_id).await?.is_none() {
            return Err(Error::CandidateNotFound(candidate_id.into()));
        }
        if stage > FIRST_STAGE {
            let eligible = self.eligible_candidates(session.id, stage).await?;
            if !eligible.iter().any(|candidate| candidate.id == candidate_id) {
                return Err(Error::CandidateNotEligible {
                    candidate: candidate_id.into(),
                    stage,
                });
            }
        }
        if mine.iter().any(|vote| vote.candidate_id == candidate_id) {
            return Err(Error::DuplicateCandidateVote(candidate_id.into()));
        }

        let eligible_voters = self.store.count_voters(Rights::Voter).await?;
        let stage_advanced =
            StageProgress::new(stage, eligible_voters, &stage_votes).completed_by(voter.id, prior);

        let vote = NewVote {
            voter_id: voter.id,
            candidate_id,
            session_id: session.id,
            stage,
            points: points_for(stage, prior),
        };
        let vote = self
            .store
            .commit_vote(vote, stage_advanced.then_some(stage))
            .await?;
        ElectionEvent::VoteRecorded {
            voter: &voter.username,
            candidate: candidate_id,
            points: vote.points,
            stage,
            session: &session.name,
        }
        .log();

        let current_stage = if stage_advanced {
            ElectionEvent::StageAdvanced {
                session: &session.name,
                stage: stage + 1,
            }
            .log();
            stage + 1
        } else {
            stage
        };
        Ok(VoteReceipt {
            vote,
            current_stage,
            stage_advanced,
        })
    }
}
