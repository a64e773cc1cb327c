#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use config::{ConfigFairing, StoreFairing};
use logging::LoggerFairing;
use model::election::Election;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// The production server: configuration from `Rocket.toml`, votes in MongoDB.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(LoggerFairing)
}

/// A server running against an existing engine, such as one backed by an
/// in-memory store.
pub fn rocket_for_election(election: Election) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(election)
}
