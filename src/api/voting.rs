use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AnyRights, AuthToken, VoterRights},
            candidate::CandidateDescription,
            results::{
                StageResults, StatusDescription, TieBreak, VoteReceiptDescription,
                WinnerDescription,
            },
        },
        election::{is_voting_stage, Election},
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![candidates, vote, results, winner, status, resolve_tie]
}

/// Every candidate, or with `stage`, those that can be voted for in that
/// stage of the active session.
#[get("/voting/candidates?<stage>")]
async fn candidates(
    _token: AuthToken<AnyRights>,
    stage: Option<u32>,
    election: &State<Election>,
) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates = match stage {
        None => election.list_candidates().await?,
        Some(stage) if is_voting_stage(stage) => {
            let session = election.active_session().await?;
            election.eligible_candidates(session.id, stage).await?
        }
        Some(stage) => return Err(Error::InvalidStage(stage)),
    };
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[post("/voting/vote/<candidate_id>/<stage>")]
async fn vote(
    token: AuthToken<AnyRights>,
    candidate_id: Id,
    stage: u32,
    election: &State<Election>,
) -> Result<Json<VoteReceiptDescription>> {
    let receipt = election.cast_vote(&token, candidate_id, stage).await?;
    Ok(Json(receipt.into()))
}

/// Standings for one stage of the active session, or of a past one.
#[get("/voting/results/<stage>?<session_id>")]
async fn results(
    _token: AuthToken<AnyRights>,
    stage: u32,
    session_id: Option<Id>,
    election: &State<Election>,
) -> Result<Json<StageResults>> {
    let session = election.session_or_active(session_id).await?;
    let results = election
        .stage_results(&session, stage)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(StageResults {
        current_stage: session.stage,
        results,
    }))
}

#[get("/voting/winner?<session_id>")]
async fn winner(
    _token: AuthToken<AnyRights>,
    session_id: Option<Id>,
    election: &State<Election>,
) -> Result<Json<WinnerDescription>> {
    let session = election.session_or_active(session_id).await?;
    let winner = election.winner(&session).await?;
    Ok(Json(winner.into()))
}

#[get("/voting/status")]
async fn status(
    token: AuthToken<AnyRights>,
    election: &State<Election>,
) -> Result<Json<StatusDescription>> {
    let status = election.voting_status(&token).await?;
    Ok(Json(status.into()))
}

#[post("/voting/resolve_tie/<stage>", data = "<choice>", format = "json")]
async fn resolve_tie(
    token: AuthToken<VoterRights>,
    stage: u32,
    choice: Json<TieBreak>,
    election: &State<Election>,
) -> Result<Json<WinnerDescription>> {
    let winner = election
        .resolve_tie(&token, stage, choice.winner_id.id())
        .await?;
    Ok(Json(winner.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{serde_json::json, Value},
    };

    use crate::model::{
        api::{
            auth::Credentials, candidate::CandidateSpec, id::ApiId, session::SessionSpec,
            voter::VoterSpec,
        },
        db::{candidate::Candidate, voter::VoterCore},
    };

    use super::*;

    async fn register(election: &Election, names: &[&str]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for name in names {
            candidates.push(
                election
                    .add_candidate(CandidateSpec::example(name))
                    .await
                    .unwrap(),
            );
        }
        candidates
    }

    async fn cast<'c>(client: &'c Client, candidate: Id, stage: u32) -> LocalResponse<'c> {
        client
            .post(uri!(vote(candidate, stage)))
            .dispatch()
            .await
    }

    async fn error_kind(response: LocalResponse<'_>) -> String {
        let body: Value = response.into_json().await.unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[backend_test(voter)]
    async fn sole_voter_runs_through_stage_one(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B", "C"]).await;
        election.start_session(SessionSpec::default()).await.unwrap();

        let response = cast(&client, candidates[0].id, 1).await;
        assert_eq!(Status::Ok, response.status());
        let receipt: VoteReceiptDescription = response.into_json().await.unwrap();
        assert_eq!(receipt.points, 3);
        assert!(!receipt.stage_advanced);

        let status: StatusDescription = client
            .get(uri!(status))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(status.votes_remaining, 2);
        assert_eq!(status.title, "Round 1. Choose the 2nd Winner (2 points) 🥈");

        cast(&client, candidates[1].id, 1).await;
        let receipt: VoteReceiptDescription = cast(&client, candidates[2].id, 1)
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(receipt.points, 1);
        assert!(receipt.stage_advanced);
        assert_eq!(receipt.current_stage, 2);

        let eligible: Vec<CandidateDescription> = client
            .get("/voting/candidates?stage=2")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let names: Vec<&str> = eligible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[backend_test(voter)]
    async fn rejected_votes(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B", "C"]).await;

        let response = cast(&client, candidates[0].id, 1).await;
        assert_eq!(Status::Conflict, response.status());
        assert_eq!(error_kind(response).await, "NoActiveSession");

        election.start_session(SessionSpec::default()).await.unwrap();
        let response = cast(&client, candidates[0].id, 2).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_kind(response).await, "InvalidStage");

        let response = cast(&client, Id::new(), 1).await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(error_kind(response).await, "CandidateNotFound");

        cast(&client, candidates[0].id, 1).await;
        let response = cast(&client, candidates[0].id, 1).await;
        assert_eq!(Status::Conflict, response.status());
        assert_eq!(error_kind(response).await, "DuplicateCandidateVote");
    }

    #[backend_test(admin)]
    async fn administrators_do_not_vote(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B"]).await;
        election.start_session(SessionSpec::default()).await.unwrap();

        let response = cast(&client, candidates[0].id, 1).await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(error_kind(response).await, "VoterNotEligible");
    }

    #[backend_test(voter)]
    async fn results_cover_every_candidate(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B", "C"]).await;
        // A second voter keeps stage 1 open.
        election
            .store()
            .insert_voter(VoterCore::example_voter("other"))
            .await
            .unwrap();
        election.start_session(SessionSpec::default()).await.unwrap();
        cast(&client, candidates[1].id, 1).await;

        let results: StageResults = client
            .get("/voting/results/1")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(results.current_stage, 1);
        assert_eq!(results.results.len(), 3);
        assert_eq!(results.results[0].candidate_id, ApiId::from(candidates[1].id));
        assert_eq!(results.results[0].points, 3);
        assert_eq!(results.results[0].total_points, 3);
        assert_eq!(results.results[1].points, 0);

        let response = client.get("/voting/winner").dispatch().await;
        assert_eq!(Status::Conflict, response.status());
        assert_eq!(error_kind(response).await, "VotingIncomplete");

        let response = client.get("/voting/candidates?stage=2").dispatch().await;
        assert_eq!(Status::Conflict, response.status());
        assert_eq!(error_kind(response).await, "InsufficientCandidates");
    }

    #[backend_test(voter)]
    async fn past_sessions_stay_readable(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B", "C"]).await;
        election
            .store()
            .insert_voter(VoterCore::example_voter("other"))
            .await
            .unwrap();
        let session = election.start_session(SessionSpec::default()).await.unwrap();
        cast(&client, candidates[2].id, 1).await;
        election.end_session().await.unwrap();

        let response = client.get("/voting/results/1").dispatch().await;
        assert_eq!(Status::Conflict, response.status());

        let results: StageResults = client
            .get(format!("/voting/results/1?session_id={}", session.id))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(results.results[0].candidate_id, ApiId::from(candidates[2].id));
    }

    #[backend_test]
    async fn arbiter_breaks_the_tie(client: Client, election: Election) {
        let credentials = Credentials::example_arbiter();
        let arbiter = election
            .add_voter(VoterSpec::arbiter(&credentials))
            .await
            .unwrap();
        let ann = election
            .store()
            .insert_voter(VoterCore::example_voter("ann"))
            .await
            .unwrap();
        let candidates = register(&election, &["A", "B", "C"]).await;
        election.start_session(SessionSpec::default()).await.unwrap();
        for voter in [&ann, &arbiter] {
            for candidate in &candidates {
                election.cast_vote(voter, candidate.id, 1).await.unwrap();
            }
        }
        election.cast_vote(&ann, candidates[0].id, 2).await.unwrap();
        election
            .cast_vote(&arbiter, candidates[1].id, 2)
            .await
            .unwrap();

        client
            .post(uri!(crate::api::auth::authenticate))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await;

        let status: StatusDescription = client
            .get(uri!(status))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(status.is_tie);
        assert!(status.is_arbiter);
        assert_eq!(status.title, "Round 3. President Tie-Breaker (1 point).");

        let response = client
            .post(uri!(resolve_tie(2)))
            .header(ContentType::JSON)
            .body(json!({ "winner_id": candidates[0].id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let resolved: WinnerDescription = response.into_json().await.unwrap();
        assert_eq!(resolved.candidate.name, "A");

        let winner: WinnerDescription = client
            .get("/voting/winner")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(winner, resolved);
    }

    #[backend_test(voter)]
    async fn voters_cannot_break_ties(client: Client, election: Election) {
        let candidates = register(&election, &["A", "B"]).await;
        election.start_session(SessionSpec::default()).await.unwrap();

        let response = client
            .post(uri!(resolve_tie(2)))
            .header(ContentType::JSON)
            .body(json!({ "winner_id": candidates[0].id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(error_kind(response).await, "ArbiterRequired");
    }
}
