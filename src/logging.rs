use log::Level;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::model::mongodb::Id;

/// Log target for changes to election state, so they can be routed to their
/// own appender.
pub const ELECTION_TARGET: &str = "runoff_backend::election";

/// A change to election state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionEvent<'a> {
    VoteRecorded {
        voter: &'a str,
        candidate: Id,
        points: u32,
        stage: u32,
        session: &'a str,
    },
    StageAdvanced {
        session: &'a str,
        stage: u32,
    },
    TieOverridden {
        arbiter: &'a str,
        candidate: Id,
        stage: u32,
        session: &'a str,
    },
    SessionStarted {
        session: &'a str,
        id: Id,
    },
    SessionEnded {
        session: &'a str,
        stage: u32,
    },
    SessionDeleted {
        id: Id,
    },
}

impl ElectionEvent<'_> {
    /// Tie overrides log as warnings.
    pub fn level(&self) -> Level {
        match self {
            Self::TieOverridden { .. } => Level::Warn,
            _ => Level::Info,
        }
    }

    pub fn log(&self) {
        log::log!(target: ELECTION_TARGET, self.level(), "{self}");
    }
}

impl Display for ElectionEvent<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VoteRecorded {
                voter,
                candidate,
                points,
                stage,
                session,
            } => write!(
                f,
                "{voter} gave {points} point(s) to candidate {candidate} in stage {stage} of {session}"
            ),
            Self::StageAdvanced { session, stage } => {
                write!(f, "Session {session} advanced to stage {stage}")
            }
            Self::TieOverridden {
                arbiter,
                candidate,
                stage,
                session,
            } => write!(
                f,
                "{arbiter} replaced the stage {stage} votes of {session} to award the tie to candidate {candidate}"
            ),
            Self::SessionStarted { session, id } => write!(f, "Started session {session} ({id})"),
            Self::SessionEnded { session, stage } => {
                write!(f, "Ended session {session} at stage {stage}")
            }
            Self::SessionDeleted { id } => write!(f, "Deleted session {id} and its votes"),
        }
    }
}

/// A sequential identifier for one request, used to pair up log lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. Wraps around to zero on overflow.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(req.local_cache(RequestId::next))
    }
}

/// When a request arrived.
struct Received(Instant);

/// Logs server lifecycle events and one line per request and response.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Election server launched on {protocol}://{ip}:{port}");
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = req.local_cache(RequestId::next);
        req.local_cache(|| Received(Instant::now()));
        info!("->req{id} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let elapsed = req.local_cache(|| Received(Instant::now())).0.elapsed();
        let code = res.status();
        let route = match req.route() {
            Some(r) => match r.name {
                Some(ref name) => format!("{name} ({})", r.uri),
                None => r.uri.to_string(),
            },
            None => "UNKNOWN ROUTE".to_string(),
        };

        let log_msg = format!("<-rsp{id} {code} {route} in {}ms", elapsed.as_millis());
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_increase() {
        let first = RequestId::next();
        let second = RequestId::next();
        assert!(second > first);
    }

    #[test]
    fn election_events_read_as_sentences() {
        let candidate = Id::new();
        let vote = ElectionEvent::VoteRecorded {
            voter: "ann",
            candidate,
            points: 3,
            stage: 1,
            session: "Session_1",
        };
        assert_eq!(
            vote.to_string(),
            format!("ann gave 3 point(s) to candidate {candidate} in stage 1 of Session_1")
        );
        assert_eq!(vote.level(), Level::Info);

        let advanced = ElectionEvent::StageAdvanced {
            session: "Session_1",
            stage: 2,
        };
        assert_eq!(advanced.to_string(), "Session Session_1 advanced to stage 2");
    }

    #[test]
    fn overrides_are_warnings() {
        let event = ElectionEvent::TieOverridden {
            arbiter: "pres",
            candidate: Id::new(),
            stage: 2,
            session: "Session_1",
        };
        assert_eq!(event.level(), Level::Warn);
    }
}
