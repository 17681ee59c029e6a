//! Request extractors with API-shaped rejections.
//!
//! Axum's default `Json` and `Path` rejections are plain-text responses;
//! these wrappers map them into [`ApiError`] so malformed bodies and ids
//! get the same JSON error shape as every other failure in the API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldError};

/// JSON body extractor whose rejection is a 400 with field errors.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

// Also usable in responses, like axum's own Json.
impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
}

/// Path extractor whose rejection is a 400 with a field error, covering
/// ids that are not valid UUIDs.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(_) => Err(ApiError::Validation(vec![FieldError::new(
                "id",
                "Invalid resource identifier",
            )])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_extracts() {
        let Json(payload) = Json::<Payload>::from_request(json_request(r#"{"name":"ok"}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.name, "ok");
    }

    #[tokio::test]
    async fn malformed_body_is_a_field_error() {
        let err = Json::<Payload>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field, "body");
    }

    #[tokio::test]
    async fn type_mismatched_field_is_a_field_error() {
        let err = Json::<Payload>::from_request(json_request(r#"{"name":5}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
