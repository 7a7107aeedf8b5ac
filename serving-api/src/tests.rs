//! Router tests against stub collaborators

#[cfg(test)]
mod integration_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use inference_core::{
        Collaborators, FixedSelector, InferenceError, InferenceMetrics, InferenceService,
        LruModelCache, Model, ModelHandle, ModelLoader, RawEventLookup, ServiceSettings,
        TabularRow, Variant, VariantSelector,
    };

    use crate::{create_router, AppState};

    const BASELINE_URI: &str = "models:/fraud-detector/Staging";
    const CANARY_URI: &str = "models:/fraud-detector/Candidate";

    struct StubModel(f64);

    impl Model for StubModel {
        fn predict_proba(&self, _row: &TabularRow) -> Result<[f64; 2], InferenceError> {
            Ok([1.0 - self.0, self.0])
        }
    }

    struct BrokenModel;

    impl Model for BrokenModel {
        fn predict_proba(&self, _row: &TabularRow) -> Result<[f64; 2], InferenceError> {
            Err(InferenceError::Prediction("boom".to_string()))
        }
    }

    struct StubLoader(HashMap<String, Arc<dyn Model>>);

    impl ModelLoader for StubLoader {
        fn load(&self, uri: &str) -> Result<ModelHandle, InferenceError> {
            self.0.get(uri)
                .map(|model| ModelHandle::new(uri, model.clone(), None))
                .ok_or_else(|| InferenceError::NotFound(uri.to_string()))
        }
    }

    fn app(selector: FixedSelector, baseline: Arc<dyn Model>) -> (Router, Arc<InferenceService>) {
        let loader = StubLoader(HashMap::from([
            (BASELINE_URI.to_string(), baseline),
            (CANARY_URI.to_string(), Arc::new(StubModel(0.9)) as Arc<dyn Model>),
        ]));
        let selector: Arc<dyn VariantSelector> = Arc::new(selector);
        let collaborators = Collaborators {
            features: Arc::new(RawEventLookup),
            selector,
            models: Arc::new(LruModelCache::new(Arc::new(loader), 4).unwrap()),
            shadow: None,
            metrics: Arc::new(InferenceMetrics::new().unwrap()),
        };
        let settings = ServiceSettings {
            baseline_uri: BASELINE_URI.to_string(),
            canary_uri: CANARY_URI.to_string(),
            model_version: "staging".to_string(),
        };
        let service = Arc::new(InferenceService::new(collaborators, settings).unwrap());
        (create_router(AppState { service: service.clone() }), service)
    }

    fn event_body() -> Value {
        json!({
            "user_id": "user-123",
            "event": {
                "event_id": "01HQA7F9G4G1YJ2R4D8K2J3A5S",
                "user_id": "user-123",
                "transaction_amount": 125.5,
                "country": "DE",
                "device": "android",
                "event_ts": "2024-03-02T14:30:00Z"
            }
        })
    }

    fn predict_request(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app(FixedSelector::baseline(), Arc::new(StubModel(0.2)));

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_predict_returns_result_with_trace_id() {
        let (router, service) = app(FixedSelector::baseline(), Arc::new(StubModel(0.2)));

        let mut request = predict_request(&event_body());
        request.headers_mut().insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".parse().unwrap(),
        );
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user_id"], "user-123");
        assert_eq!(body["model_version"], "staging");
        assert_eq!(body["decision"], "approve");
        assert_eq!(body["canary_variant"], "baseline");
        assert_eq!(body["trace_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
        assert!((body["score"].as_f64().unwrap() - 0.2).abs() < 1e-9);

        assert_eq!(service.metrics().requests(Variant::Baseline), 1);
    }

    #[tokio::test]
    async fn test_predict_rejects_invalid_events() {
        let mut cases = Vec::new();

        let mut body = event_body();
        body["event"]["transaction_amount"] = json!(6000.0);
        cases.push(body);

        let mut body = event_body();
        body["event"]["country"] = json!("XX");
        cases.push(body);

        let mut body = event_body();
        body["event"]["event_ts"] = json!((Utc::now() + Duration::hours(1)).to_rfc3339());
        cases.push(body);

        let mut body = event_body();
        body["event"]["event_id"] = json!("short");
        cases.push(body);

        for body in cases {
            let (router, service) = app(FixedSelector::baseline(), Arc::new(StubModel(0.2)));
            let response = router.oneshot(predict_request(&body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            let error = json_body(response).await;
            assert_eq!(error["status"], 400);

            // Rejected before routing
            assert_eq!(service.metrics().requests(Variant::Baseline), 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (router, _) = app(FixedSelector::baseline(), Arc::new(StubModel(0.2)));

        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"user_id\": "))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_scoring_failure_is_server_error() {
        let (router, service) = app(FixedSelector::baseline(), Arc::new(BrokenModel));

        let response = router.oneshot(predict_request(&event_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["status"], 500);
        assert_eq!(service.metrics().exceptions(Variant::Baseline), 1);
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let (router, _) = app(FixedSelector::canary(), Arc::new(StubModel(0.2)));

        let response = router.clone().oneshot(predict_request(&event_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("serving_app_requests_total{model_variant=\"canary\"} 1"));
        assert!(text.contains("serving_app_request_latency_seconds_bucket"));
    }
}
