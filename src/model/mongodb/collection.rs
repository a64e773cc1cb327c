use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    session::{NewSession, Session},
    vote::{NewVote, Vote},
    voter::{NewVoter, Voter},
};

/// Name of the partial index that allows at most one active session.
pub const ACTIVE_SESSION_INDEX: &str = "unique_active_session";

/// Name of the partial index that allows at most one arbiter.
pub const ARBITER_INDEX: &str = "unique_arbiter";

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Voter collections
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}
impl MongoCollection for NewVoter {
    const NAME: &'static str = VOTERS;
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Session collections
const SESSIONS: &str = "sessions";
impl MongoCollection for Session {
    const NAME: &'static str = SESSIONS;
}
impl MongoCollection for NewSession {
    const NAME: &'static str = SESSIONS;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Voter collection: unique usernames, and at most one arbiter.
    let voters = Coll::<Voter>::from_db(db);
    let voter_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique.clone())
        .build();
    voters.create_index(voter_index, None).await?;
    let arbiter_index = IndexModel::builder()
        .keys(doc! {"is_arbiter": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(ARBITER_INDEX.to_string())
                .partial_filter_expression(doc! {"is_arbiter": true})
                .build(),
        )
        .build();
    voters.create_index(arbiter_index, None).await?;

    // Candidate collection.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique.clone())
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Session collection: unique names, and at most one active session.
    let sessions = Coll::<Session>::from_db(db);
    let name_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique.clone())
        .build();
    sessions.create_index(name_index, None).await?;
    let active_index = IndexModel::builder()
        .keys(doc! {"active": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(ACTIVE_SESSION_INDEX.to_string())
                .partial_filter_expression(doc! {"active": true})
                .build(),
        )
        .build();
    sessions.create_index(active_index, None).await?;

    // Vote collection: one vote per voter, candidate and stage.
    let vote_index = IndexModel::builder()
        .keys(doc! {"session_id": 1, "stage": 1, "voter_id": 1, "candidate_id": 1})
        .options(unique)
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_index, None)
        .await?;

    Ok(())
}
