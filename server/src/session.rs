use std::convert::Infallible;
use std::fmt;

use uuid::Uuid;
use warp::reply::{with_header, Reply};
use warp::Filter;

/// The cookie that carries the session identifier.
pub const SESSION_COOKIE: &str = "session_id";

/// An anonymous session identifier. Sessions have no record of their
/// own; the identifier is only referenced by votes and
/// recommendations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        SessionId(uuid)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The session attached to a request, and whether it was issued just
/// now (in which case the response must set the cookie).
#[derive(Clone, Copy, Debug)]
pub struct Session {
    pub id: SessionId,
    pub issued: bool,
}

impl Session {
    /// Resolves the session from the raw cookie value, issuing a new
    /// one if it’s missing or unparseable.
    pub fn from_cookie(cookie: Option<String>) -> Self {
        match cookie.and_then(|c| Uuid::parse_str(&c).ok()) {
            Some(uuid) => Session {
                id: SessionId(uuid),
                issued: false,
            },
            None => Session {
                id: SessionId::new(),
                issued: true,
            },
        }
    }

    /// Adds a `Set-Cookie` header to the reply if the session was
    /// issued for this request.
    pub fn attach(&self, reply: Box<dyn Reply>) -> Box<dyn Reply> {
        if self.issued {
            Box::new(with_header(reply, "set-cookie", self.cookie()))
        } else {
            reply
        }
    }

    fn cookie(&self) -> String {
        format!("{}={}; HttpOnly; Path=/", SESSION_COOKIE, self.id)
    }
}

/// Extracts the request’s session from its cookie.
pub fn session() -> impl Filter<Extract = (Session,), Error = Infallible> + Clone {
    warp::cookie::optional(SESSION_COOKIE).map(Session::from_cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_valid_cookie() {
        let uuid = Uuid::new_v4();
        let session = Session::from_cookie(Some(uuid.to_string()));

        assert_eq!(session.id.as_uuid(), &uuid);
        assert!(!session.issued);
    }

    #[test]
    fn issues_session_for_missing_or_garbled_cookie() {
        assert!(Session::from_cookie(None).issued);
        assert!(Session::from_cookie(Some("not-a-uuid".to_owned())).issued);
    }

    #[tokio::test]
    async fn filter_reads_cookie_header() {
        let uuid = Uuid::new_v4();

        let session = warp::test::request()
            .header("cookie", format!("{}={}", SESSION_COOKIE, uuid))
            .filter(&session())
            .await
            .unwrap();

        assert_eq!(session.id, SessionId::from(uuid));
        assert!(!session.issued);
    }
}
