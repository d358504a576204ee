use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use log::{debug, o};

use crate::aggregation;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::session::Session;
use crate::video::VideoId;
use crate::vote::{self as ledger, Vote};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

#[derive(Debug, Deserialize)]
struct SubmissionBody {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoteBody {
    vote: Option<String>,
}

pub async fn list(environment: Environment, session: Session) -> RouteResult {
    timed! {
        let views = aggregation::list_videos(&environment, &session.id)
            .await
            .map_err(|e| Rejection::new(Context::list(), e))?;

        session.attach(Box::new(json(&views)))
    }
}

pub async fn submit(environment: Environment, session: Session, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::submit(None), e);

        let submission: SubmissionBody = parse_body(&body).map_err(error_handler)?;
        // a missing ID is just another malformed one
        let raw_id = submission.id.unwrap_or_default();

        let error_handler = |e: BackendError| Rejection::new(Context::submit(Some(raw_id.clone())), e);

        let id = aggregation::submit_video(&environment, &session.id, raw_id.clone())
            .await
            .map_err(error_handler)?;

        session.attach(Box::new(with_status(
            json(&SuccessResponse::Submitted { id }),
            StatusCode::CREATED,
        )))
    }
}

pub async fn vote(
    environment: Environment,
    id: String,
    session: Session,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::vote(id.clone()), e);

        let video_id = VideoId::parse(id.clone()).map_err(error_handler)?;
        let ballot: VoteBody = parse_body(&body).map_err(error_handler)?;
        let vote: Vote = ballot
            .vote
            .unwrap_or_default()
            .parse()
            .map_err(error_handler)?;

        let logger = environment
            .logger
            .new(o!("video_id" => id.clone(), "session_id" => session.id.to_string()));
        debug!(logger, "Casting vote..."; "vote" => %vote);

        let tally = ledger::cast(&environment, &session.id, &video_id, vote)
            .await
            .map_err(error_handler)?;

        session.attach(Box::new(json(&tally)))
    }
}

pub async fn score(environment: Environment, session: Session) -> RouteResult {
    timed! {
        let score = aggregation::session_score(&environment, &session.id)
            .await
            .map_err(|e| Rejection::new(Context::score(), e))?;

        session.attach(Box::new(json(&SuccessResponse::Score { score })))
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(BackendError::MalformedRequest)
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
