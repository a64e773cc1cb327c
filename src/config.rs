use chrono::Duration;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{election::Election, mongodb::MongoStore};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    admin_username: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Valid lifetime of auth tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Username of the administrator created on first start.
    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Password of the administrator created on first start.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match rocket.figment().extract::<Config>() {
            Ok(config) => Ok(rocket.manage(config)),
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                Err(rocket)
            }
        }
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    db_name: String,
    // secrets
    db_uri: String,
}

/// A fairing that connects to MongoDB, makes sure the indexes and the
/// bootstrap administrator exist, and puts the resulting [`Election`] into
/// managed state. Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let db_config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let Some((admin_username, admin_password)) = rocket
            .state::<Config>()
            .map(|c| (c.admin_username().to_string(), c.admin_password().to_string()))
        else {
            error!("Application config must be loaded before the database");
            return Err(rocket);
        };

        info!("Loaded database config, connecting...");
        let store = match MongoStore::connect(&db_config.db_uri, &db_config.db_name).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let election = Election::new(std::sync::Arc::new(store));

        let bootstrap = election
            .ensure_admin_exists(&admin_username, &admin_password)
            .await;
        if let Err(e) = bootstrap {
            error!("Failed to create the bootstrap administrator: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        Ok(rocket.manage(election))
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self::example_with_secret("test secret, do not use")
        }

        pub fn example_with_secret(secret: &str) -> Self {
            Self {
                auth_ttl: 600,
                admin_username: "coordinator".to_string(),
                jwt_secret: secret.to_string(),
                admin_password: "runoff4lyfe".to_string(),
            }
        }
    }
}
