use std::collections::BTreeSet;

use crate::model::{db::vote::Vote, mongodb::Id};

use super::{vote_limit, FINAL_STAGE};

/// Where a stage stands just before a vote is recorded in it.
#[derive(Debug, Clone)]
pub struct StageProgress {
    stage: u32,
    eligible_voters: u64,
    votes_cast: u64,
    voters: BTreeSet<Id>,
}

impl StageProgress {
    /// `votes` must be every vote already recorded in this session stage.
    pub fn new(stage: u32, eligible_voters: u64, votes: &[Vote]) -> Self {
        Self {
            stage,
            eligible_voters,
            votes_cast: votes.len() as u64,
            voters: votes.iter().map(|vote| vote.voter_id).collect(),
        }
    }

    /// Would `voter`'s next vote, following `prior` earlier ones of theirs in
    /// this stage, be the one that completes the stage?
    ///
    /// That needs the vote to use up the voter's allowance, every eligible
    /// voter to have then voted, and the stage to hold exactly the expected
    /// number of votes. The final stage never completes this way.
    pub fn completed_by(&self, voter: Id, prior: u32) -> bool {
        let limit = vote_limit(self.stage);
        if self.stage >= FINAL_STAGE || prior + 1 != limit {
            return false;
        }
        let voters = self.voters.len() as u64 + u64::from(!self.voters.contains(&voter));
        let expected = self.eligible_voters * u64::from(limit);
        voters == self.eligible_voters && self.votes_cast + 1 == expected
    }
}
