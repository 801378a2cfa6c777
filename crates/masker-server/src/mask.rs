//! Redaction API: `POST /mask/custom`, `GET /health`

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use masker_engine::{MaskEngine, MaskRequest, MaskResponse};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiResult;

pub fn router(engine: Arc<MaskEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mask/custom", post(mask_custom))
        .route("/health", get(health))
        .layer(cors)
        .with_state(engine)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "mask" }))
}

/// POST /mask/custom - Redact text for the requested labels
async fn mask_custom(State(engine): State<Arc<MaskEngine>>, Json(req): Json<MaskRequest>) -> ApiResult<Json<MaskResponse>> {
    Ok(Json(engine.mask(&req).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use masker_extract::RuleExtractor;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(MaskEngine::new(Arc::new(RuleExtractor::new()))))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_mask_custom() {
        let response = app()
            .oneshot(post_json(
                "/mask/custom",
                json!({
                    "text": "手机13812345678，邮箱zhang@example.com",
                    "schemalist": ["手机号码", "电子邮箱"],
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["masked"], "手机138****5678，邮箱*****************");
        assert_eq!(body["entities_found"][0]["method"], "regex");
        assert_eq!(body["entities_found"][1]["label"], "电子邮箱");
        assert_eq!(body["optional_selected"], json!(["电子邮箱"]));
        assert_eq!(body["mandatory"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let response = app()
            .oneshot(post_json("/mask/custom", json!({ "text": "  " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "detail": "text is empty" }));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok", "service": "mask" }));
    }
}
