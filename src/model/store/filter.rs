use mongodb::bson::{doc, Document};

use crate::model::{db::vote::Vote, mongodb::Id};

/// A conjunctive predicate over votes. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteFilter {
    pub session_id: Option<Id>,
    pub stage: Option<u32>,
    pub voter_id: Option<Id>,
    pub candidate_id: Option<Id>,
}

impl VoteFilter {
    /// All votes of a session.
    pub fn session(session_id: Id) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::default()
        }
    }

    /// All votes of one stage of a session.
    pub fn stage(session_id: Id, stage: u32) -> Self {
        Self {
            stage: Some(stage),
            ..Self::session(session_id)
        }
    }

    pub fn voter(mut self, voter_id: Id) -> Self {
        self.voter_id = Some(voter_id);
        self
    }

    pub fn candidate(mut self, candidate_id: Id) -> Self {
        self.candidate_id = Some(candidate_id);
        self
    }

    pub fn matches(&self, vote: &Vote) -> bool {
        self.session_id.map_or(true, |id| vote.session_id == id)
            && self.stage.map_or(true, |stage| vote.stage == stage)
            && self.voter_id.map_or(true, |id| vote.voter_id == id)
            && self.candidate_id.map_or(true, |id| vote.candidate_id == id)
    }

    /// The equivalent MongoDB query document.
    pub fn to_doc(&self) -> Document {
        let mut filter = doc! {};
        if let Some(id) = self.session_id {
            filter.insert("session_id", id);
        }
        if let Some(stage) = self.stage {
            filter.insert("stage", stage);
        }
        if let Some(id) = self.voter_id {
            filter.insert("voter_id", id);
        }
        if let Some(id) = self.candidate_id {
            filter.insert("candidate_id", id);
        }
        filter
    }
}
