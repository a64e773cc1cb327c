use mongodb::{
    bson::{doc, Bson, Document},
    error::{Error as DbError, ErrorKind, WriteFailure},
    options::FindOptions,
    Client, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    api::auth::Rights,
    db::{
        candidate::{Candidate, NewCandidate},
        session::{NewSession, Session},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter},
    },
    store::{with_retry, Store, VoteFilter},
};

use super::{
    collection::{ensure_indexes_exist, Coll, ACTIVE_SESSION_INDEX, ARBITER_INDEX},
    errors::is_duplicate_key_error,
    Id,
};

/// The production [`Store`], backed by MongoDB.
///
/// Multi-document writes run inside a transaction, so the deployment must be
/// a replica set. The single-active-session rule is enforced by a partial
/// unique index rather than a read-then-write check.
pub struct MongoStore {
    client: Client,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
    sessions: Coll<Session>,
    new_sessions: Coll<NewSession>,
    votes: Coll<Vote>,
    new_votes: Coll<NewVote>,
}

impl MongoStore {
    /// Wrap an existing connection.
    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            voters: Coll::from_db(db),
            new_voters: Coll::from_db(db),
            candidates: Coll::from_db(db),
            new_candidates: Coll::from_db(db),
            sessions: Coll::from_db(db),
            new_sessions: Coll::from_db(db),
            votes: Coll::from_db(db),
            new_votes: Coll::from_db(db),
        }
    }

    /// Connect to the given deployment and make sure the indexes exist.
    pub async fn connect(db_uri: &str, db_name: &str) -> std::result::Result<Self, DbError> {
        let client = Client::with_uri_str(db_uri).await?;
        let db = client.database(db_name);
        ensure_indexes_exist(&db).await?;
        Ok(Self::new(client, &db))
    }
}

/// Extract the ID the server assigned to an inserted document.
fn inserted_id(id: Bson) -> Result<Id> {
    id.as_object_id()
        .map(Id::from)
        .ok_or_else(|| Error::StoreUnavailable(format!("Unexpected inserted ID {id}")))
}

/// Did this write violate the named unique index?
fn is_index_clash(err: &DbError, index: &str) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.message.contains(index),
        _ => false,
    }
}

/// Sort by ID, i.e. by creation order.
fn by_id() -> FindOptions {
    FindOptions::builder().sort(doc! {"_id": 1}).build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter> {
        let voter = &voter;
        with_retry("insert voter", || async move {
            match self.new_voters.insert_one(voter, None).await {
                Ok(result) => Ok(Voter {
                    id: inserted_id(result.inserted_id)?,
                    voter: voter.clone(),
                }),
                Err(err) if is_index_clash(&err, ARBITER_INDEX) => {
                    Err(Error::AlreadyExists("An arbiter".to_string()))
                }
                Err(err) if is_duplicate_key_error(&err) => {
                    Err(Error::AlreadyExists(format!("Voter {}", voter.username)))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn voter(&self, id: Id) -> Result<Option<Voter>> {
        with_retry("find voter", || async move {
            Ok(self.voters.find_one(id.as_doc(), None).await?)
        })
        .await
    }

    async fn voter_by_username(&self, username: &str) -> Result<Option<Voter>> {
        with_retry("find voter by username", || async move {
            let filter = doc! { "username": username };
            Ok(self.voters.find_one(filter, None).await?)
        })
        .await
    }

    async fn voters(&self) -> Result<Vec<Voter>> {
        with_retry("list voters", || async move {
            Ok(self
                .voters
                .find(None, by_id())
                .await?
                .try_collect()
                .await?)
        })
        .await
    }

    async fn count_voters(&self, rights: Rights) -> Result<u64> {
        with_retry("count voters", || async move {
            let filter = doc! { "rights": rights };
            Ok(self.voters.count_documents(filter, None).await?)
        })
        .await
    }

    async fn delete_voter(&self, id: Id) -> Result<bool> {
        with_retry("delete voter", || async move {
            let result = self.voters.delete_one(id.as_doc(), None).await?;
            Ok(result.deleted_count == 1)
        })
        .await
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let candidate = &candidate;
        with_retry("insert candidate", || async move {
            match self.new_candidates.insert_one(candidate, None).await {
                Ok(result) => Ok(Candidate {
                    id: inserted_id(result.inserted_id)?,
                    candidate: candidate.clone(),
                }),
                Err(err) if is_duplicate_key_error(&err) => {
                    Err(Error::AlreadyExists(format!("Candidate {}", candidate.name)))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn candidate(&self, id: Id) -> Result<Option<Candidate>> {
        with_retry("find candidate", || async move {
            Ok(self.candidates.find_one(id.as_doc(), None).await?)
        })
        .await
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        with_retry("list candidates", || async move {
            Ok(self
                .candidates
                .find(None, by_id())
                .await?
                .try_collect()
                .await?)
        })
        .await
    }

    async fn delete_candidate(&self, id: Id) -> Result<bool> {
        with_retry("delete candidate", || async move {
            let result = self.candidates.delete_one(id.as_doc(), None).await?;
            Ok(result.deleted_count == 1)
        })
        .await
    }

    async fn insert_session(&self, session: NewSession) -> Result<Session> {
        let session = &session;
        with_retry("insert session", || async move {
            match self.new_sessions.insert_one(session, None).await {
                Ok(result) => Ok(Session {
                    id: inserted_id(result.inserted_id)?,
                    session: session.clone(),
                }),
                Err(err) if is_index_clash(&err, ACTIVE_SESSION_INDEX) => {
                    Err(Error::SessionAlreadyActive)
                }
                Err(err) if is_duplicate_key_error(&err) => {
                    Err(Error::AlreadyExists(format!("Session {}", session.name)))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn session(&self, id: Id) -> Result<Option<Session>> {
        with_retry("find session", || async move {
            Ok(self.sessions.find_one(id.as_doc(), None).await?)
        })
        .await
    }

    async fn active_session(&self) -> Result<Option<Session>> {
        with_retry("find active session", || async move {
            Ok(self.sessions.find_one(doc! {"active": true}, None).await?)
        })
        .await
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        with_retry("list sessions", || async move {
            Ok(self
                .sessions
                .find(None, by_id())
                .await?
                .try_collect()
                .await?)
        })
        .await
    }

    async fn deactivate_session(&self, id: Id) -> Result<bool> {
        with_retry("deactivate session", || async move {
            let filter = doc! { "_id": id, "active": true };
            let update = doc! { "$set": { "active": false } };
            let result = self.sessions.update_one(filter, update, None).await?;
            Ok(result.modified_count == 1)
        })
        .await
    }

    async fn delete_session(&self, id: Id) -> Result<bool> {
        with_retry("delete session", || async move {
            let mut db_session = self.client.start_session(None).await?;
            db_session.start_transaction(None).await?;

            let result = self
                .sessions
                .delete_one_with_session(id.as_doc(), None, &mut db_session)
                .await?;
            if result.deleted_count == 0 {
                db_session.abort_transaction().await?;
                return Ok(false);
            }
            self.votes
                .delete_many_with_session(
                    VoteFilter::session(id).to_doc(),
                    None,
                    &mut db_session,
                )
                .await?;

            db_session.commit_transaction().await?;
            Ok(true)
        })
        .await
    }

    async fn votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let filter: &Document = &filter.to_doc();
        with_retry("find votes", || async move {
            Ok(self
                .votes
                .find(filter.clone(), by_id())
                .await?
                .try_collect()
                .await?)
        })
        .await
    }

    async fn count_votes(&self, filter: &VoteFilter) -> Result<u64> {
        let filter: &Document = &filter.to_doc();
        with_retry("count votes", || async move {
            Ok(self.votes.count_documents(filter.clone(), None).await?)
        })
        .await
    }

    async fn commit_vote(&self, vote: NewVote, advance_from: Option<u32>) -> Result<Vote> {
        let vote = &vote;
        with_retry("commit vote", || async move {
            let mut db_session = self.client.start_session(None).await?;
            db_session.start_transaction(None).await?;

            let id = match self
                .new_votes
                .insert_one_with_session(vote, None, &mut db_session)
                .await
            {
                Ok(result) => inserted_id(result.inserted_id)?,
                Err(err) if is_duplicate_key_error(&err) => {
                    db_session.abort_transaction().await?;
                    return Err(Error::DuplicateCandidateVote(vote.candidate_id.into()));
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(from) = advance_from {
                let filter = doc! { "_id": vote.session_id, "stage": from };
                let update = doc! { "$inc": { "stage": 1 } };
                let result = self
                    .sessions
                    .update_one_with_session(filter, update, None, &mut db_session)
                    .await?;
                if result.modified_count != 1 {
                    db_session.abort_transaction().await?;
                    return Err(Error::InvalidStage(from));
                }
            }

            db_session.commit_transaction().await?;
            Ok(Vote {
                id,
                vote: vote.clone(),
            })
        })
        .await
    }

    async fn replace_stage_votes(&self, vote: NewVote) -> Result<Vote> {
        let vote = &vote;
        with_retry("replace stage votes", || async move {
            let mut db_session = self.client.start_session(None).await?;
            db_session.start_transaction(None).await?;

            let stage = VoteFilter::stage(vote.session_id, vote.stage).to_doc();
            self.votes
                .delete_many_with_session(stage, None, &mut db_session)
                .await?;
            let result = self
                .new_votes
                .insert_one_with_session(vote, None, &mut db_session)
                .await?;
            let id = inserted_id(result.inserted_id)?;

            db_session.commit_transaction().await?;
            Ok(Vote {
                id,
                vote: vote.clone(),
            })
        })
        .await
    }
}
