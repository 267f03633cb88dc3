//! Request extractors that keep rejections inside the response envelope

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::ApiError;

/// JSON extractor whose rejection speaks the `{error, msg}` envelope
///
/// The stock `Json` extractor reports malformed bodies as plain-text
/// rejections with its own status codes; this wrapper folds them into
/// [`ApiError::Validation`] so a body like `{"cart": "x"}` comes back as
/// the same 400 envelope every other validation failure uses.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;

    use crate::routes::products::BuyRequest;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn envelope_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn non_array_cart_is_rejected_with_the_envelope() {
        let err = ApiJson::<BuyRequest>::from_request(json_request(r#"{"cart": "x"}"#), &())
            .await
            .expect_err("non-array cart must be rejected");

        assert!(matches!(err, ApiError::Validation(_)));

        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert!(body["msg"].is_string());
    }

    #[tokio::test]
    async fn truncated_json_is_rejected_with_the_envelope() {
        let err = ApiJson::<BuyRequest>::from_request(json_request(r#"{"cart": ["#), &())
            .await
            .expect_err("truncated JSON must be rejected");

        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let request = json_request(r#"{"cart": [{"id": 1, "qty": 2}]}"#);
        let ApiJson(payload) = ApiJson::<BuyRequest>::from_request(request, &())
            .await
            .expect("well-formed body must parse");

        assert_eq!(payload.cart.len(), 1);
        assert_eq!(payload.cart[0].id, 1);
        assert_eq!(payload.cart[0].qty, 2);
    }
}
