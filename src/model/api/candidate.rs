use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::candidate::{Candidate, NewCandidate},
};

/// A request to register a candidate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        Self {
            name: spec.name.trim().to_string(),
            description: spec.description,
            photo: spec.photo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub photo: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.into(),
            name: candidate.candidate.name,
            description: candidate.candidate.description,
            photo: candidate.candidate.photo,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateSpec {
        pub fn example(name: &str) -> Self {
            Self {
                name: name.to_string(),
                description: Some(format!("{name} for chair")),
                photo: Some(format!("https://example.org/{name}.png")),
            }
        }
    }
}
