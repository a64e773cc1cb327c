use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::session::Session};

/// A request to start a session. Both fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub stage: u32,
}

impl From<Session> for SessionDescription {
    fn from(session: Session) -> Self {
        Self {
            id: session.id.into(),
            name: session.session.name,
            description: session.session.description,
            created_at: session.session.created_at,
            active: session.session.active,
            stage: session.session.stage,
        }
    }
}
