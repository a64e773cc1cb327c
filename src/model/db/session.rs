use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The first stage of every session.
pub const FIRST_STAGE: u32 = 1;

/// Core session data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCore {
    /// Unique across all sessions.
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// At most one session is active at a time.
    pub active: bool,
    /// Current stage. Starts at [`FIRST_STAGE`] and only ever increases.
    pub stage: u32,
}

impl SessionCore {
    /// A freshly started session.
    pub fn new(name: String, description: Option<String>) -> Self {
        let created_at = Utc::now();
        let description = description.or_else(|| Some(created_at.date_naive().to_string()));
        Self {
            name,
            description,
            created_at,
            active: true,
            stage: FIRST_STAGE,
        }
    }
}

/// A session without an ID.
pub type NewSession = SessionCore;

/// A session from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub session: SessionCore,
}

impl Deref for Session {
    type Target = SessionCore;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_active_at_stage_one() {
        let session = NewSession::new("Session_1".to_string(), None);
        assert!(session.active);
        assert_eq!(session.stage, FIRST_STAGE);
        assert_eq!(
            session.description,
            Some(session.created_at.date_naive().to_string())
        );
    }
}
