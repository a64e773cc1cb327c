mod credentials;
mod token;
mod user;

pub use credentials::{Credentials, LoginResponse};
pub use token::{auth_cookie, AuthToken, Claims, AUTH_TOKEN_COOKIE};
pub use user::{AdminRights, AnyRights, Rights, Role, VoterRights};
