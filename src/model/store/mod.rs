//! The persistence interface the election engine runs against.
//!
//! Every method is a single atomic unit: implementations must make the
//! multi-record writes ([`Store::commit_vote`], [`Store::replace_stage_votes`],
//! [`Store::delete_session`]) all-or-nothing, and must enforce the
//! single-active-session invariant inside [`Store::insert_session`].

mod filter;
mod memory;
mod retry;

pub use filter::VoteFilter;
pub use memory::MemoryStore;
pub use retry::{with_retry, MAX_ATTEMPTS};

use crate::error::Result;
use crate::model::{
    api::auth::Rights,
    db::{
        candidate::{Candidate, NewCandidate},
        session::{NewSession, Session},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter},
    },
    mongodb::Id,
};

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Insert a voter. Fails with `AlreadyExists` if the username is taken
    /// or if the voter is an arbiter and there already are `MAX_ARBITERS`.
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter>;
    async fn voter(&self, id: Id) -> Result<Option<Voter>>;
    async fn voter_by_username(&self, username: &str) -> Result<Option<Voter>>;
    async fn voters(&self) -> Result<Vec<Voter>>;
    async fn count_voters(&self, rights: Rights) -> Result<u64>;
    async fn delete_voter(&self, id: Id) -> Result<bool>;

    /// Insert a candidate. Fails with `AlreadyExists` if the name is taken.
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;
    async fn candidate(&self, id: Id) -> Result<Option<Candidate>>;
    async fn candidates(&self) -> Result<Vec<Candidate>>;
    async fn delete_candidate(&self, id: Id) -> Result<bool>;

    /// Insert a session. Fails with `SessionAlreadyActive` if the new session
    /// is active while another one is, and `AlreadyExists` on a name clash.
    async fn insert_session(&self, session: NewSession) -> Result<Session>;
    async fn session(&self, id: Id) -> Result<Option<Session>>;
    async fn active_session(&self) -> Result<Option<Session>>;
    async fn sessions(&self) -> Result<Vec<Session>>;
    /// Mark a session inactive. Returns false if it was not active.
    async fn deactivate_session(&self, id: Id) -> Result<bool>;
    /// Delete a session together with all of its votes.
    async fn delete_session(&self, id: Id) -> Result<bool>;

    async fn votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>>;
    async fn count_votes(&self, filter: &VoteFilter) -> Result<u64>;
    /// Record a vote and, if `advance_from` is given, move the vote's session
    /// from that stage to the next one in the same atomic write. Fails with
    /// `InvalidStage` without writing anything if the session is no longer at
    /// `advance_from`.
    async fn commit_vote(&self, vote: NewVote, advance_from: Option<u32>) -> Result<Vote>;
    /// Atomically delete every vote of one session stage and write `vote` in
    /// their place.
    async fn replace_stage_votes(&self, vote: NewVote) -> Result<Vote>;
}
