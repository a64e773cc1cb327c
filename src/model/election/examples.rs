//! Ready-made elections for tests.

use crate::model::{
    api::{candidate::CandidateSpec, session::SessionSpec},
    db::{candidate::Candidate, voter::Voter, voter::VoterCore},
    mongodb::Id,
    store::MemoryStore,
};

use super::Election;

/// An election with a started session, some plain voters, the arbiter, and
/// registered candidates.
pub struct Electorate {
    pub election: Election,
    pub voters: Vec<Voter>,
    pub arbiter: Voter,
    pub candidates: Vec<Candidate>,
}

impl Electorate {
    pub async fn new(voters: &[&str], candidates: &[&str]) -> Self {
        let election = Election::new(MemoryStore::shared());
        let store = election.store();

        let mut plain = Vec::new();
        for name in voters {
            plain.push(
                store
                    .insert_voter(VoterCore::example_voter(name))
                    .await
                    .unwrap(),
            );
        }
        let arbiter = store
            .insert_voter(VoterCore::example_arbiter("pres"))
            .await
            .unwrap();

        let mut registered = Vec::new();
        for name in candidates {
            registered.push(
                election
                    .add_candidate(CandidateSpec::example(name))
                    .await
                    .unwrap(),
            );
        }
        election.start_session(SessionSpec::default()).await.unwrap();

        Self {
            election,
            voters: plain,
            arbiter,
            candidates: registered,
        }
    }

    /// One plain voter and the arbiter both rank A, B, C, then split stage 2
    /// between A and B. The session is left at stage 3 with a tie.
    pub async fn tied() -> Self {
        let electorate = Self::new(&["ann"], &["A", "B", "C"]).await;
        electorate.rank([0, 1, 2]).await;
        electorate
            .election
            .cast_vote(&electorate.voters[0], electorate.candidate(0), 2)
            .await
            .unwrap();
        electorate
            .election
            .cast_vote(&electorate.arbiter, electorate.candidate(1), 2)
            .await
            .unwrap();
        electorate
    }

    pub fn candidate(&self, index: usize) -> Id {
        self.candidates[index].id
    }

    /// Plain voters first, then the arbiter.
    pub fn everyone(&self) -> Vec<Voter> {
        let mut all = self.voters.clone();
        all.push(self.arbiter.clone());
        all
    }

    /// Everyone ranks the given candidates in order, completing stage 1.
    pub async fn rank(&self, picks: [usize; 3]) {
        for voter in self.everyone() {
            for pick in picks {
                self.election
                    .cast_vote(&voter, self.candidate(pick), 1)
                    .await
                    .unwrap();
            }
        }
    }
}
