//! Classifying driver errors: which ones are key clashes and which are
//! worth another attempt.

use mongodb::error::{
    Error as DbError, ErrorKind, WriteFailure, RETRYABLE_WRITE_ERROR, TRANSIENT_TRANSACTION_ERROR,
};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Return true if the given error is worth retrying: the connection dropped,
/// no server could be selected, or the server labelled it as transient.
pub fn is_transient(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
        || err.contains_label(RETRYABLE_WRITE_ERROR)
        || matches!(
            *err.kind,
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. }
        )
}
