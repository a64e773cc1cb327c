use serde::{Deserialize, Serialize};

use crate::model::{
    api::{candidate::CandidateDescription, id::ApiId},
    election::{Standing, VoteReceipt, VotingStatus, Winner},
};

/// One candidate's line in a stage's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingDescription {
    pub candidate_id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    /// Points in the requested stage.
    pub points: u32,
    /// Points across every stage of the session.
    pub total_points: u32,
}

impl From<Standing> for StandingDescription {
    fn from(standing: Standing) -> Self {
        let candidate = standing.candidate;
        Self {
            candidate_id: candidate.id.into(),
            name: candidate.candidate.name,
            description: candidate.candidate.description,
            photo: candidate.candidate.photo,
            points: standing.points,
            total_points: standing.total_points,
        }
    }
}

/// Results of one stage, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResults {
    pub current_stage: u32,
    pub results: Vec<StandingDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerDescription {
    pub candidate: CandidateDescription,
    /// The winner's stage-2 points.
    pub stage_points: u32,
    pub total_points: u32,
    /// Did the arbiter's vote settle it?
    pub decided_by_arbiter: bool,
}

impl From<Winner> for WinnerDescription {
    fn from(winner: Winner) -> Self {
        Self {
            candidate: winner.candidate.into(),
            stage_points: winner.stage_points,
            total_points: winner.total_points,
            decided_by_arbiter: winner.decided_by_arbiter,
        }
    }
}

/// What a particular account should see right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDescription {
    pub session_id: ApiId,
    pub stage: u32,
    pub title: String,
    pub message: String,
    pub votes_remaining: u32,
    pub is_tie: bool,
    pub is_arbiter: bool,
    pub winner: Option<WinnerDescription>,
}

impl From<VotingStatus> for StatusDescription {
    fn from(status: VotingStatus) -> Self {
        Self {
            session_id: status.session_id.into(),
            stage: status.stage,
            title: status.title,
            message: status.message,
            votes_remaining: status.votes_remaining,
            is_tie: status.is_tie,
            is_arbiter: status.is_arbiter,
            winner: status.winner.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceiptDescription {
    pub message: String,
    pub candidate_id: ApiId,
    pub stage: u32,
    pub points: u32,
    /// The session's stage after the vote was recorded.
    pub current_stage: u32,
    pub stage_advanced: bool,
}

impl From<VoteReceipt> for VoteReceiptDescription {
    fn from(receipt: VoteReceipt) -> Self {
        let message = if receipt.stage_advanced {
            format!("Vote recorded. Stage {} is now open.", receipt.current_stage)
        } else {
            "Vote recorded.".to_string()
        };
        Self {
            message,
            candidate_id: receipt.vote.candidate_id.into(),
            stage: receipt.vote.stage,
            points: receipt.vote.points,
            current_stage: receipt.current_stage,
            stage_advanced: receipt.stage_advanced,
        }
    }
}

/// The arbiter's choice when breaking a tie.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TieBreak {
    pub winner_id: ApiId,
}
