use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            error: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) error: String,
}

/// What the request was trying to do when it failed.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    List,
    Score,
    Submit { id: Option<String> },
    Vote { id: String },
}

impl Context {
    pub fn list() -> Context {
        Context::List
    }

    pub fn score() -> Context {
        Context::Score
    }

    pub fn submit(id: Option<String>) -> Context {
        Context::Submit { id }
    }

    pub fn vote(id: String) -> Context {
        Context::Vote { id }
    }
}
