use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::{
            auth::{
                auth_cookie, AnyRights, AuthToken, Claims, Credentials, LoginResponse,
                AUTH_TOKEN_COOKIE,
            },
            voter::VoterDescription,
        },
        election::Election,
    },
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout, me]
}

#[post("/auth/token", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<Credentials>,
    election: &State<Election>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    let voter = election
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    let token = Claims::new(&voter, config).encode(config)?;
    cookies.add(auth_cookie(token.clone(), config));

    Ok(Json(LoginResponse::bearer(token, voter.into())))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[get("/users/me")]
pub fn me(token: AuthToken<AnyRights>) -> Json<VoterDescription> {
    Json(token.into_inner().into())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::model::api::{auth::Rights, voter::VoterSpec};

    use super::*;

    #[backend_test]
    async fn authenticate_valid(client: Client, election: Election) {
        let credentials = Credentials::example_voter();
        election
            .add_voter(VoterSpec::voter(&credentials))
            .await
            .unwrap();

        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
        let login: LoginResponse = response.into_json().await.unwrap();
        assert_eq!(login.token_type, "bearer");
        assert_eq!(login.voter.username, credentials.username);
        assert_eq!(login.voter.rights, Rights::Voter);
    }

    #[backend_test]
    async fn authenticate_invalid(client: Client, election: Election) {
        let credentials = Credentials::example_voter();
        election
            .add_voter(VoterSpec::voter(&credentials))
            .await
            .unwrap();

        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": &credentials.username,
                    "password": "not the password",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
        let body: rocket::serde::json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "AuthFailure");
    }

    #[backend_test(voter)]
    async fn logout_forgets_the_token(client: Client) {
        let response = client.get(uri!(me)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let response = client.delete(uri!(logout)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        let response = client.get(uri!(me)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn bearer_header_is_accepted(client: Client, election: Election) {
        let credentials = Credentials::example_arbiter();
        election
            .add_voter(VoterSpec::arbiter(&credentials))
            .await
            .unwrap();
        let login: LoginResponse = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        // Drop the cookie so only the header is presented.
        client.delete(uri!(logout)).dispatch().await;

        let response = client
            .get(uri!(me))
            .header(Header::new(
                "Authorization",
                format!("Bearer {}", login.access_token),
            ))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let me: VoterDescription = response.into_json().await.unwrap();
        assert!(me.is_arbiter);
    }

    #[backend_test]
    async fn garbage_tokens_are_refused(client: Client) {
        let response = client
            .get(uri!(me))
            .header(Header::new("Authorization", "Bearer not.a.token"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: rocket::serde::json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "InvalidToken");
    }

    #[backend_test(voter)]
    async fn removed_accounts_are_locked_out(client: Client, election: Election) {
        let voter = election
            .store()
            .voter_by_username(&Credentials::example_voter().username)
            .await
            .unwrap()
            .unwrap();
        election.remove_voter(voter.id).await.unwrap();

        let response = client.get(uri!(me)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
