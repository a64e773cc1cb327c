use crate::error::{Error, Result};
use crate::model::{
    db::{candidate::Candidate, session::Session, voter::Voter},
    mongodb::Id,
    store::VoteFilter,
};

use super::{
    is_tie, is_voting_stage, vote_limit, Election, Score, DECIDING_STAGE, FINAL_STAGE,
};

/// A candidate's standing in one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub candidate: Candidate,
    pub points: u32,
    pub total_points: u32,
}

/// The decided winner of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub candidate: Candidate,
    /// Points from the deciding stage.
    pub stage_points: u32,
    /// Points across every stage.
    pub total_points: u32,
    pub decided_by_arbiter: bool,
}

/// What one account should be shown right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotingStatus {
    pub session_id: Id,
    pub stage: u32,
    pub title: String,
    pub message: String,
    pub votes_remaining: u32,
    pub is_tie: bool,
    pub is_arbiter: bool,
    pub winner: Option<Winner>,
}

fn points_of(scores: &[Score], candidate_id: Id) -> u32 {
    scores
        .iter()
        .find(|score| score.candidate_id == candidate_id)
        .map_or(0, |score| score.points)
}

/// Title and message for the voting screen.
pub fn headline(
    stage: u32,
    is_arbiter: bool,
    is_tie: bool,
    votes_remaining: u32,
    has_winner: bool,
) -> (String, String) {
    const OTHERS: &str = "Waiting for other users to finish voting...";

    if has_winner {
        return ("Voting Completed!".to_string(), String::new());
    }
    let (title, message) = match (stage, votes_remaining) {
        (1, 3) => ("Choose the 1st Winner (3 points) 🏆", ""),
        (1, 2) => ("Choose the 2nd Winner (2 points) 🥈", ""),
        (1, 1) => ("Choose the 3rd Winner (1 point) 🥉", ""),
        (2, 1) => ("Choose the Winner (1 point) 🏆", ""),
        (1 | 2, _) => ("Voting Completed!", OTHERS),
        (_, _) if !is_tie => (
            "Calculating final results...",
            "The final results are being calculated.",
        ),
        (_, 1) if is_arbiter => ("President Tie-Breaker (1 point).", ""),
        (_, _) if is_arbiter => (
            "Voting Completed!",
            "Waiting for results to be processed...",
        ),
        (_, _) => (
            "Waiting for President to break the tie.",
            "The president will cast the deciding vote.",
        ),
    };
    (format!("Round {stage}. {title}"), message.to_string())
}

impl Election {
    /// Every registered candidate with their points in `stage` and across
    /// the session, best in the stage first. Candidates without votes come
    /// last, in registration order.
    pub async fn stage_results(&self, session: &Session, stage: u32) -> Result<Vec<Standing>> {
        if !is_voting_stage(stage) {
            return Err(Error::InvalidStage(stage));
        }
        let stage_scores = self.stage_scores(session.id, stage).await?;
        let totals = self.cumulative_scores(session.id).await?;

        let mut standings: Vec<Standing> = self
            .store
            .candidates()
            .await?
            .into_iter()
            .map(|candidate| Standing {
                points: points_of(&stage_scores, candidate.id),
                total_points: points_of(&totals, candidate.id),
                candidate,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });
        Ok(standings)
    }

    /// Decide the winner of a session from its stage-2 scores, falling back
    /// to the arbiter's stage-3 vote when the top two are level.
    pub async fn winner(&self, session: &Session) -> Result<Winner> {
        if session.stage < FINAL_STAGE {
            return Err(Error::VotingIncomplete);
        }
        let scores = self.stage_scores(session.id, DECIDING_STAGE).await?;
        let (leader, decided_by_arbiter) = match scores.as_slice() {
            [] => return Err(Error::NoStage2Votes),
            [first, ..] if !is_tie(&scores) => (*first, false),
            _ => {
                let deciding = self
                    .store
                    .votes(&VoteFilter::stage(session.id, FINAL_STAGE))
                    .await?;
                let vote = deciding.first().ok_or(Error::TieUnresolved)?;
                let leader = Score {
                    candidate_id: vote.candidate_id,
                    points: points_of(&scores, vote.candidate_id),
                };
                (leader, true)
            }
        };

        let candidate = self
            .store
            .candidate(leader.candidate_id)
            .await?
            .ok_or(Error::CandidateNotFound(leader.candidate_id.into()))?;
        let total_points = self
            .cumulative_points(session.id, leader.candidate_id)
            .await?;
        Ok(Winner {
            candidate,
            stage_points: leader.points,
            total_points,
            decided_by_arbiter,
        })
    }

    /// The winner, if one can be decided yet.
    async fn winner_if_decided(&self, session: &Session) -> Result<Option<Winner>> {
        match self.winner(session).await {
            Ok(winner) => Ok(Some(winner)),
            Err(Error::VotingIncomplete | Error::NoStage2Votes | Error::TieUnresolved) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// What `voter` should see for the active session. Reads only.
    pub async fn voting_status(&self, voter: &Voter) -> Result<VotingStatus> {
        let session = self.active_session().await?;
        let stage = session.stage;
        let is_arbiter = voter.is_arbiter && voter.is_eligible_voter();
        let winner = self.winner_if_decided(&session).await?;
        let is_tie = stage >= FINAL_STAGE
            && is_tie(&self.stage_scores(session.id, DECIDING_STAGE).await?);

        let votes_remaining = if winner.is_some()
            || !voter.is_eligible_voter()
            || (stage >= FINAL_STAGE && !is_arbiter)
        {
            0
        } else {
            let cast = self
                .store
                .count_votes(&VoteFilter::stage(session.id, stage).voter(voter.id))
                .await?;
            u64::from(vote_limit(stage)).saturating_sub(cast) as u32
        };

        let (title, message) =
            headline(stage, is_arbiter, is_tie, votes_remaining, winner.is_some());
        Ok(VotingStatus {
            session_id: session.id,
            stage,
            title,
            message,
            votes_remaining,
            is_tie,
            is_arbiter,
            winner,
        })
    }
}
