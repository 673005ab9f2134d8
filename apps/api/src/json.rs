//! JSON request bodies whose rejections speak the service's error format.
//!
//! Axum's own `Json` rejects with plain text; these wrappers answer
//! `MissingInput` with the usual `{ "error": { "code", "message" } }` body.

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

fn rejected(e: JsonRejection) -> AppError {
    AppError::MissingInput(format!("invalid JSON body: {}", e.body_text()))
}

/// A required JSON body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(rejected)?;
        Ok(JsonBody(value))
    }
}

/// A JSON body the caller may leave out. An empty body yields `T::default()`;
/// anything else has to parse.
#[derive(Debug)]
pub struct OptionalJsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::MissingInput(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJsonBody(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(OptionalJsonBody)
            .map_err(|e| AppError::MissingInput(format!("invalid JSON body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Target {
        #[serde(default)]
        title: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(value) = content_type {
            builder = builder.header(CONTENT_TYPE, value);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_body_is_missing_input() {
        let err = JsonBody::<Target>::from_request(request(Some("application/json"), "{oops"), &())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "MISSING_INPUT");
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_missing_input() {
        let err = JsonBody::<Target>::from_request(request(None, r#"{"title": "x"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "MISSING_INPUT");
    }

    #[tokio::test]
    async fn test_optional_body_defaults_only_when_empty() {
        let OptionalJsonBody(empty) =
            OptionalJsonBody::<Target>::from_request(request(None, ""), &())
                .await
                .unwrap();
        assert_eq!(empty, Target::default());

        let OptionalJsonBody(given) = OptionalJsonBody::<Target>::from_request(
            request(Some("application/json"), r#"{"title": "CV"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(given.title, "CV");

        let err = OptionalJsonBody::<Target>::from_request(
            request(Some("application/json"), r#"{"title": "#),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "MISSING_INPUT");
    }
}
