//! JSON body extractor
//!
//! `axum::Json` 的拒绝响应是纯文本 4xx；这里统一转成 `ValidationFailed` 的 `ApiResponse` 错误体。

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use shared::error::AppError;

/// Request body parsed as JSON, rejecting with [`AppError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    tracing::debug!(status = %rejection.status(), error = %rejection.body_text(), "Rejected JSON body");
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON body".to_string(),
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
        JsonRejection::JsonDataError(_) => "Invalid request body".to_string(),
        _ => "Failed to read request body".to_string(),
    };
    AppError::validation(message).with_detail("reason", rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;
    use shared::error::ErrorCode;

    #[derive(Debug, Deserialize)]
    struct Title {
        #[allow(dead_code)]
        title: String,
    }

    async fn extract(content_type: Option<&str>, body: &str) -> Result<ValidJson<Title>, AppError> {
        let mut builder = http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        ValidJson::<Title>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_rejections_become_validation_errors() {
        assert!(extract(Some("application/json"), r#"{"title":"ok"}"#).await.is_ok());

        let err = extract(Some("application/json"), "{}").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Invalid request body");

        let err = extract(Some("application/json"), "{").await.unwrap_err();
        assert_eq!(err.message, "Malformed JSON body");

        let err = extract(None, r#"{"title":"ok"}"#).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Expected a JSON body");
    }
}
