use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// JSON body that is deserialized and validated before reaching a handler.
///
/// An empty body reads as `{}`, so a missing payload fails on its required
/// fields rather than on parsing. Malformed JSON and validation failures are
/// both 400s.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(AppError::bad_request)?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        let value: T = serde_json::from_slice(body)
            .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[serde(default)]
        #[validate(length(min = 1))]
        content: String,
    }

    async fn extract(body: &'static str) -> Result<Payload, AppError> {
        let request = Request::builder().body(Body::from(body)).unwrap();
        ValidatedJson::<Payload>::from_request(request, &())
            .await
            .map(|ValidatedJson(p)| p)
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        assert_eq!(extract(r#"{"content": "x"}"#).await.unwrap().content, "x");
    }

    #[tokio::test]
    async fn empty_body_is_treated_as_empty_object() {
        let err = extract("").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = extract("{not json").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
