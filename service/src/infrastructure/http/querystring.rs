use std::ops::Deref;
use std::sync::Arc;

use anyhow::Error;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_querystring::ParseMode;

/// Query string extractor; the editor location (`id`, `type`, `tag`) is
/// parsed with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryString<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryString<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let QueryStringConfig { mode, ehandler } = parts
            .extensions
            .get::<QueryStringConfig>()
            .cloned()
            .unwrap_or_default();

        let query = parts.uri.query().unwrap_or_default();
        let value = serde_querystring::from_str(query, mode).map_err(|e| {
            tracing::debug!(query, error = %e, "rejected query string");
            match ehandler {
                Some(ehandler) => ehandler(e.into()),
                None => QueryStringError::default().into_response(),
            }
        })?;
        Ok(QueryString(value))
    }
}

impl<T> Deref for QueryString<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Per-router parsing options, installed as a request extension.
#[derive(Clone)]
pub struct QueryStringConfig {
    mode: ParseMode,
    ehandler: Option<Arc<dyn Fn(Error) -> Response + Send + Sync>>,
}

impl Default for QueryStringConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::UrlEncoded,
            ehandler: None,
        }
    }
}

impl QueryStringConfig {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            ehandler: None,
        }
    }

    pub fn ehandler<F, R>(mut self, ehandler: F) -> Self
    where
        F: Fn(Error) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.ehandler = Some(Arc::new(move |e| ehandler(e).into_response()));
        self
    }
}

#[derive(Debug)]
struct QueryStringError {
    status: StatusCode,
    body: String,
}

impl Default for QueryStringError {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: String::from("Invalid editor location"),
        }
    }
}

impl IntoResponse for QueryStringError {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Location {
        id: Option<String>,
        #[serde(rename = "type")]
        content_type: Option<String>,
        tag: Option<String>,
    }

    async fn extract(uri: &str, config: Option<QueryStringConfig>) -> Result<Location, Response> {
        let mut request = Request::builder().uri(uri).body(()).unwrap();
        if let Some(config) = config {
            request.extensions_mut().insert(config);
        }
        let (mut parts, _) = request.into_parts();
        QueryString::<Location>::from_request_parts(&mut parts, &())
            .await
            .map(|QueryString(location)| location)
    }

    #[tokio::test]
    async fn test_editor_location_is_decoded() {
        let location = extract("/editor?id=!local-abc&type=page&tag=rust%20lang", None)
            .await
            .unwrap();

        assert_eq!(
            location,
            Location {
                id: Some("!local-abc".to_string()),
                content_type: Some("page".to_string()),
                tag: Some("rust lang".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_error_handler_is_used() {
        let config = QueryStringConfig::new(ParseMode::UrlEncoded)
            .ehandler(|_| StatusCode::UNPROCESSABLE_ENTITY);

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            count: u32,
        }
        let mut request = Request::builder().uri("/x?count=many").body(()).unwrap();
        request.extensions_mut().insert(config);
        let (mut parts, _) = request.into_parts();

        let rejection = QueryString::<Strict>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
