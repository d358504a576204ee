use serde::Serialize;

use crate::video::VideoId;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Score {
        score: i64,
    },
    Submitted {
        id: VideoId,
    },
}
