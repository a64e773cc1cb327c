use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{
    db::{candidate::Candidate, session::FIRST_STAGE, vote::Vote},
    mongodb::Id,
    store::VoteFilter,
};

use super::{Election, FINALISTS};

/// A candidate's aggregate points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub candidate_id: Id,
    pub points: u32,
}

/// Sum the points of `votes` per candidate.
///
/// Highest score first; equal scores are ordered by candidate ID so the
/// result is deterministic. Candidates without votes do not appear.
pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Vec<Score> {
    let mut totals: BTreeMap<Id, u32> = BTreeMap::new();
    for vote in votes {
        *totals.entry(vote.candidate_id).or_default() += vote.points;
    }
    let mut scores: Vec<_> = totals
        .into_iter()
        .map(|(candidate_id, points)| Score {
            candidate_id,
            points,
        })
        .collect();
    scores.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    scores
}

/// The candidates going through to `next_stage`, given the ordered scores of
/// the stage before it: the top [`FINALISTS`], plus everyone level with the
/// last of them.
pub fn finalists(scores: &[Score], next_stage: u32) -> Result<Vec<Score>> {
    if scores.len() < FINALISTS {
        return Err(Error::InsufficientCandidates(next_stage));
    }
    let cutoff = scores[FINALISTS - 1].points;
    Ok(scores
        .iter()
        .take_while(|score| score.points >= cutoff)
        .copied()
        .collect())
}

/// Are the top two of these ordered scores level?
pub fn is_tie(scores: &[Score]) -> bool {
    matches!(scores, [first, second, ..] if first.points == second.points)
}

impl Election {
    /// Ordered aggregate scores for one stage of a session.
    pub async fn stage_scores(&self, session_id: Id, stage: u32) -> Result<Vec<Score>> {
        let votes = self
            .store
            .votes(&VoteFilter::stage(session_id, stage))
            .await?;
        Ok(tally(&votes))
    }

    /// Ordered aggregate scores across every stage of a session.
    pub async fn cumulative_scores(&self, session_id: Id) -> Result<Vec<Score>> {
        let votes = self.store.votes(&VoteFilter::session(session_id)).await?;
        Ok(tally(&votes))
    }

    /// Points a candidate has collected across every stage of a session.
    pub async fn cumulative_points(&self, session_id: Id, candidate_id: Id) -> Result<u32> {
        let filter = VoteFilter::session(session_id).candidate(candidate_id);
        let votes = self.store.votes(&filter).await?;
        Ok(votes.iter().map(|vote| vote.points).sum())
    }

    /// Candidates that can be voted for in `stage` of a session. Everyone is
    /// eligible in the first stage; later stages take the finalists of the
    /// stage before, best first.
    pub async fn eligible_candidates(&self, session_id: Id, stage: u32) -> Result<Vec<Candidate>> {
        let mut candidates = self.store.candidates().await?;
        if stage <= FIRST_STAGE {
            return Ok(candidates);
        }

        let scores = self.stage_scores(session_id, stage - 1).await?;
        let finalists = finalists(&scores, stage)?;
        let rank = |id: &Id| finalists.iter().position(|score| score.candidate_id == *id);
        candidates.retain(|candidate| rank(&candidate.id).is_some());
        candidates.sort_by_key(|candidate| rank(&candidate.id));
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::vote::VoteCore;

    fn votes(cast: &[(Id, u32)]) -> Vec<Vote> {
        let session_id = Id::new();
        cast.iter()
            .map(|&(candidate_id, points)| Vote {
                id: Id::new(),
                vote: VoteCore {
                    voter_id: Id::new(),
                    candidate_id,
                    session_id,
                    stage: 1,
                    points,
                },
            })
            .collect()
    }

    fn score(candidate_id: Id, points: u32) -> Score {
        Score {
            candidate_id,
            points,
        }
    }

    #[test]
    fn tally_sums_and_orders() {
        let (a, b, c) = (Id::new(), Id::new(), Id::new());
        let cast = votes(&[(a, 3), (b, 2), (c, 1), (a, 3), (c, 2), (b, 1)]);
        assert_eq!(tally(&cast), vec![score(a, 6), score(b, 3), score(c, 3)]);
    }

    #[test]
    fn tally_of_nothing_is_empty() {
        assert!(tally(&[]).is_empty());
    }

    #[test]
    fn top_two_go_through() {
        let (a, b, c, d) = (Id::new(), Id::new(), Id::new(), Id::new());
        let scores = [score(a, 9), score(b, 6), score(c, 3), score(d, 1)];
        assert_eq!(finalists(&scores, 2).unwrap(), vec![score(a, 9), score(b, 6)]);
    }

    #[test]
    fn ties_at_the_cutoff_all_go_through() {
        let (a, b, c, d) = (Id::new(), Id::new(), Id::new(), Id::new());
        let scores = [score(a, 9), score(b, 5), score(c, 5), score(d, 4)];
        assert_eq!(
            finalists(&scores, 2).unwrap(),
            vec![score(a, 9), score(b, 5), score(c, 5)]
        );

        let level = [score(a, 4), score(b, 4), score(c, 4)];
        assert_eq!(finalists(&level, 2).unwrap().len(), 3);
    }

    #[test]
    fn one_scored_candidate_cannot_produce_finalists() {
        let scores = [score(Id::new(), 9)];
        assert!(matches!(
            finalists(&scores, 2),
            Err(Error::InsufficientCandidates(2))
        ));
    }

    #[test]
    fn ties_only_count_at_the_top() {
        let (a, b, c) = (Id::new(), Id::new(), Id::new());
        assert!(is_tie(&[score(a, 1), score(b, 1)]));
        assert!(!is_tie(&[score(a, 2), score(b, 1), score(c, 1)]));
        assert!(!is_tie(&[score(a, 2)]));
        assert!(!is_tie(&[]));
    }
}
