mod bson;
mod collection;
mod errors;
mod store;

pub use bson::Id;
pub use collection::{
    ensure_indexes_exist, Coll, MongoCollection, ACTIVE_SESSION_INDEX, ARBITER_INDEX,
};
pub use errors::{is_duplicate_key_error, is_transient};
pub use store::MongoStore;
