use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{AdminRights, AnyRights, AuthToken},
            candidate::{CandidateDescription, CandidateSpec},
            session::{SessionDescription, SessionSpec},
            voter::{VoterDescription, VoterSpec},
        },
        election::Election,
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_candidates,
        create_candidate,
        delete_candidate,
        get_voters,
        create_voter,
        delete_voter,
        get_sessions,
        start_session,
        end_session,
        delete_session,
        current_session,
    ]
}

#[get("/admin/candidates")]
async fn get_candidates(
    _token: AuthToken<AdminRights>,
    election: &State<Election>,
) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates = election.list_candidates().await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[post("/admin/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<AdminRights>,
    spec: Json<CandidateSpec>,
    election: &State<Election>,
) -> Result<Json<CandidateDescription>> {
    let candidate = election.add_candidate(spec.into_inner()).await?;
    Ok(Json(candidate.into()))
}

#[delete("/admin/candidates/<candidate_id>")]
async fn delete_candidate(
    _token: AuthToken<AdminRights>,
    candidate_id: Id,
    election: &State<Election>,
) -> Result<()> {
    election.remove_candidate(candidate_id).await
}

#[get("/admin/voters")]
async fn get_voters(
    _token: AuthToken<AdminRights>,
    election: &State<Election>,
) -> Result<Json<Vec<VoterDescription>>> {
    let voters = election.list_voters().await?;
    Ok(Json(voters.into_iter().map(Into::into).collect()))
}

#[post("/admin/voters", data = "<spec>", format = "json")]
async fn create_voter(
    _token: AuthToken<AdminRights>,
    spec: Json<VoterSpec>,
    election: &State<Election>,
) -> Result<Json<VoterDescription>> {
    let voter = election.add_voter(spec.into_inner()).await?;
    Ok(Json(voter.into()))
}

#[delete("/admin/voters/<voter_id>")]
async fn delete_voter(
    _token: AuthToken<AdminRights>,
    voter_id: Id,
    election: &State<Election>,
) -> Result<()> {
    election.remove_voter(voter_id).await
}

#[get("/admin/sessions")]
async fn get_sessions(
    _token: AuthToken<AdminRights>,
    election: &State<Election>,
) -> Result<Json<Vec<SessionDescription>>> {
    let sessions = election.list_sessions().await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// Start a session. The body is optional.
#[post("/admin/sessions/start", data = "<spec>")]
async fn start_session(
    _token: AuthToken<AdminRights>,
    spec: Option<Json<SessionSpec>>,
    election: &State<Election>,
) -> Result<Json<SessionDescription>> {
    let spec = spec.map(Json::into_inner).unwrap_or_default();
    let session = election.start_session(spec).await?;
    Ok(Json(session.into()))
}

#[post("/admin/sessions/end")]
async fn end_session(
    _token: AuthToken<AdminRights>,
    election: &State<Election>,
) -> Result<Json<SessionDescription>> {
    let session = election.end_session().await?;
    Ok(Json(session.into()))
}

#[delete("/admin/sessions/<session_id>")]
async fn delete_session(
    _token: AuthToken<AdminRights>,
    session_id: Id,
    election: &State<Election>,
) -> Result<()> {
    election.delete_session(session_id).await
}

#[get("/sessions/current")]
async fn current_session(
    _token: AuthToken<AnyRights>,
    election: &State<Election>,
) -> Result<Json<SessionDescription>> {
    let session = election.current_session().await?;
    Ok(Json(session.into()))
}
