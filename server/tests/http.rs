use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::test::RequestBuilder;

use backend::db::MemoryDb;
use backend::environment::Environment;
use backend::routes::make_api_routes;
use backend::session::{SessionId, SESSION_COOKIE};
use backend::testing::{environment, StubCatalog};
use backend::video::VideoId;

const VIDEO_ID: &str = "dQw4w9WgXcQ";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct SubmissionResponse {
    id: String,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct TallyResponse {
    likes: i64,
    dislikes: i64,
    session_like: bool,
    session_dislike: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct VideoResponse {
    id: String,
    title: String,
    thumbnail_url: String,
    likes: i64,
    dislikes: i64,
    session_like: bool,
    session_dislike: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ScoreResponse {
    score: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

struct Harness {
    db: Arc<MemoryDb>,
    catalog: Arc<StubCatalog>,
    environment: Environment,
}

impl Harness {
    fn new() -> Self {
        let db = Arc::new(MemoryDb::new());
        let catalog = Arc::new(StubCatalog::new());
        let environment = environment(db.clone(), catalog.clone());

        Harness {
            db,
            catalog,
            environment,
        }
    }

    async fn send(&self, request: RequestBuilder) -> (StatusCode, Bytes) {
        let response = request.reply(&make_api_routes(self.environment.clone())).await;

        (response.status(), response.body().clone())
    }

    async fn submit(&self, session: Uuid, id: &str) -> (StatusCode, Bytes) {
        self.send(
            with_session(warp::test::request(), session)
                .method("POST")
                .path("/api/videos")
                .json(&json!({ "id": id })),
        )
        .await
    }

    async fn vote(&self, session: Uuid, id: &str, vote: &str) -> (StatusCode, Bytes) {
        self.send(
            with_session(warp::test::request(), session)
                .method("POST")
                .path(&format!("/api/videos/{}/vote", id))
                .json(&json!({ "vote": vote })),
        )
        .await
    }

    async fn list(&self, session: Uuid) -> Vec<VideoResponse> {
        let (status, body) = self
            .send(with_session(warp::test::request(), session).path("/api/videos"))
            .await;

        assert_eq!(status, StatusCode::OK);
        parse(&body)
    }

    async fn score(&self, session: Uuid) -> i64 {
        let (status, body) = self
            .send(with_session(warp::test::request(), session).path("/api/user/score"))
            .await;

        assert_eq!(status, StatusCode::OK);
        parse::<ScoreResponse>(&body).score
    }
}

fn with_session(request: RequestBuilder, session: Uuid) -> RequestBuilder {
    request.header("cookie", format!("{}={}", SESSION_COOKIE, session))
}

fn parse<'a, T: Deserialize<'a>>(body: &'a Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "parse {:?} as {}: {}",
            String::from_utf8_lossy(body),
            std::any::type_name::<T>(),
            e
        )
    })
}

#[tokio::test]
async fn api_works() {
    let harness = Harness::new();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let (status, body) = harness.submit(a, VIDEO_ID).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        parse::<SubmissionResponse>(&body),
        SubmissionResponse {
            id: VIDEO_ID.to_owned()
        }
    );

    let (status, body) = harness.vote(a, VIDEO_ID, "like").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<TallyResponse>(&body),
        TallyResponse {
            likes: 1,
            dislikes: 0,
            session_like: true,
            session_dislike: false,
        }
    );

    let (status, body) = harness.vote(b, VIDEO_ID, "dislike").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<TallyResponse>(&body),
        TallyResponse {
            likes: 1,
            dislikes: 1,
            session_like: false,
            session_dislike: true,
        }
    );

    let videos = harness.list(a).await;
    assert_eq!(
        videos,
        vec![VideoResponse {
            id: VIDEO_ID.to_owned(),
            title: String::new(),
            thumbnail_url: String::new(),
            likes: 1,
            dislikes: 1,
            session_like: true,
            session_dislike: false,
        }]
    );

    assert_eq!(harness.score(a).await, 1);
    assert_eq!(harness.score(b).await, 0);
}

#[tokio::test]
async fn listing_fills_in_metadata_from_catalog() {
    let harness = Harness::new();
    let session = Uuid::new_v4();
    let id = VideoId::parse(VIDEO_ID).unwrap();

    harness.catalog.insert(
        &id,
        "Never Gonna Give You Up",
        Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"),
        Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg"),
    );
    harness.submit(session, VIDEO_ID).await;

    let videos = harness.list(session).await;
    assert_eq!(videos[0].title, "Never Gonna Give You Up");
    assert_eq!(
        videos[0].thumbnail_url,
        "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );

    // fresh now, so listing again doesn’t go back to the catalog
    harness.list(session).await;
    assert_eq!(harness.catalog.lookups(), 1);
}

#[tokio::test]
async fn invalid_submissions_are_rejected() {
    let harness = Harness::new();
    let session = Uuid::new_v4();

    for id in &["short", "dQw4w9WgXcQQ", "dQw4w9WgXc/"] {
        let (status, body) = harness.submit(session, id).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "submitting {:?}", id);
        assert!(parse::<ErrorResponse>(&body).error.starts_with("invalid video ID"));
    }

    let (status, _) = harness
        .send(
            with_session(warp::test::request(), session)
                .method("POST")
                .path("/api/videos")
                .body("{ not json"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness
        .send(
            with_session(warp::test::request(), session)
                .method("POST")
                .path("/api/videos")
                .json(&json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(harness.db.video_count(), 0);
    assert_eq!(harness.db.recommendation_count(), 0);
}

#[tokio::test]
async fn invalid_votes_are_rejected() {
    let harness = Harness::new();
    let session = Uuid::new_v4();
    let id = VideoId::parse(VIDEO_ID).unwrap();

    harness.vote(session, VIDEO_ID, "like").await;

    let (status, body) = harness.vote(session, VIDEO_ID, "meh").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse::<ErrorResponse>(&body).error.starts_with("invalid vote"));

    let (status, _) = harness.vote(session, "short", "dislike").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(harness.db.vote_count(), 1);
    assert_eq!(
        harness.db.vote(&SessionId::from(session), &id),
        Some(backend::vote::Vote::Like)
    );
}

#[tokio::test]
async fn revoting_overwrites() {
    let harness = Harness::new();
    let session = Uuid::new_v4();

    harness.vote(session, VIDEO_ID, "like").await;
    let (_, body) = harness.vote(session, VIDEO_ID, "dislike").await;

    assert_eq!(
        parse::<TallyResponse>(&body),
        TallyResponse {
            likes: 0,
            dislikes: 1,
            session_like: false,
            session_dislike: true,
        }
    );
    assert_eq!(harness.db.vote_count(), 1);
}

#[tokio::test]
async fn new_sessions_get_a_cookie() {
    let harness = Harness::new();

    let response = warp::test::request()
        .path("/api/user/score")
        .reply(&make_api_routes(harness.environment.clone()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("get set-cookie header")
        .to_str()
        .expect("convert set-cookie header to string");
    let value = cookie
        .strip_prefix(&format!("{}=", SESSION_COOKIE))
        .and_then(|rest| rest.split(';').next())
        .expect("get session from cookie");

    assert!(Uuid::parse_str(value).is_ok());
    assert!(cookie.contains("HttpOnly"));
    assert!(response.headers().contains_key("server-timing"));

    let known = with_session(warp::test::request(), Uuid::new_v4())
        .path("/api/user/score")
        .reply(&make_api_routes(harness.environment.clone()))
        .await;

    assert!(!known.headers().contains_key("set-cookie"));
}
