use rocket::{Catcher, Request, Route};

use crate::error::Error;

mod admin;
mod auth;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(voting::routes());
    routes
}

/// JSON bodies for failures raised outside a handler, e.g. by request guards.
pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden, not_found]
}

#[catch(401)]
fn unauthorized() -> Error {
    Error::InvalidToken
}

#[catch(403)]
fn forbidden() -> Error {
    Error::InsufficientRights
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Error {
    Error::not_found(req.uri().to_string())
}
