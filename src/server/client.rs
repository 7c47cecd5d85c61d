use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use axum_extra::headers::{HeaderMapExt, UserAgent};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Caller identity recorded with each lookup: `"<ip>_<user-agent>"`.
///
/// Missing parts are rendered as `-`, so extraction never fails. The peer
/// address is only present when the server runs with connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint(pub String);

impl ClientFingerprint {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());

        let user_agent = parts
            .headers
            .typed_get::<UserAgent>()
            .map(|ua| ua.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        Ok(ClientFingerprint(format!("{ip}_{user_agent}")))
    }
}
