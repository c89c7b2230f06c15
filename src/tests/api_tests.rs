#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::middleware::from_fn_with_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt; // for .collect()
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::ingest;
    use crate::routes;
    use crate::state::AppState;
    use crate::store::SnapshotStore;
    use crate::tests::scenario_records;
    use crate::types::CongressRecord;

    /// Snapshot-backed app over a temp directory. The TempDir must stay
    /// alive for the duration of the test.
    fn setup_test_app(records: &[CongressRecord]) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let snapshot_path = dir.path().join("congresses.json");
        ingest::write_snapshot(&snapshot_path, records).unwrap();

        let mut config = AppConfig::default();
        config.data.backend = "snapshot".to_string();
        config.data.snapshot_path = snapshot_path.to_string_lossy().to_string();

        let store = Arc::new(SnapshotStore::new(&snapshot_path));
        let state = AppState::new(store, None, config, None);

        let app = Router::new()
            .route("/health", get(routes::health::health))
            .route("/version", get(routes::health::version))
            .route("/v1/congresses", get(routes::congresses::list_congresses))
            .route("/v1/exports", post(routes::exports::create_export))
            .with_state(state.clone())
            .layer(from_fn_with_state(
                state.config.clone(),
                crate::middleware::security_headers::security_headers_middleware,
            ));

        (app, dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_record_count() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response =
            app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["congresses"], 3);
    }

    #[tokio::test]
    async fn test_health_503_when_snapshot_missing() {
        let (app, dir) = setup_test_app(&scenario_records());
        std::fs::remove_file(dir.path().join("congresses.json")).unwrap();

        let response =
            app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (app, _dir) = setup_test_app(&[]);

        let response =
            app.oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.get("name").is_some());
        assert!(json.get("version").is_some());
        assert!(json.get("build").is_some());
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let (app, _dir) = setup_test_app(&[]);

        let response =
            app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();

        let headers = response.headers();
        assert!(headers.contains_key("x-content-type-options"));
        assert!(headers.contains_key("x-frame-options"));
        assert!(headers.contains_key("referrer-policy"));
        // JSON responses must not be cached.
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_congresses_filtered_page() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/congresses?tier=1&sort=name&dir=asc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;

        let names: Vec<&str> =
            json["items"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Beta", "Zeta"]);
        assert_eq!(json["total"], 2);
        assert_eq!(json["page"], 1);
        assert_eq!(json["pageSize"], 25);
        assert_eq!(json["facets"]["tier"], json!([{ "value": "1", "count": 2 }]));
    }

    #[tokio::test]
    async fn test_congresses_defaults_and_structure() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app
            .oneshot(Request::builder().uri("/v1/congresses").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total"], 3);
        for facet in ["tier", "region", "country", "month", "ind"] {
            assert!(json["facets"][facet].is_array(), "missing facet {}", facet);
        }
        // Default sort: name ascending.
        let names: Vec<&str> =
            json["items"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Zeta"]);
    }

    fn export_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/exports")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_export_validation_errors() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app.oneshot(export_request(json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = json["error"]["details"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"exportType"));
        assert!(fields.contains(&"consentExport"));
    }

    #[tokio::test]
    async fn test_export_rejects_bad_email_and_format() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app
            .oneshot(export_request(json!({
                "email": "not-an-email",
                "exportType": "pdf",
                "consentExport": true,
                "filters": {}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let fields: Vec<&str> = json["error"]["details"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "exportType"]);
    }

    #[tokio::test]
    async fn test_export_honeypot_short_circuits() {
        // A filled honeypot gets the success response without validation,
        // persistence or delivery.
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app
            .oneshot(export_request(json!({ "_hp": "gotcha", "email": "broken" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_export_500_when_mailer_unconfigured() {
        let (app, _dir) = setup_test_app(&scenario_records());

        let response = app
            .oneshot(export_request(json!({
                "email": "jane@example.org",
                "exportType": "csv",
                "consentExport": true,
                "filters": { "tier": ["1"] }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_CONFIGURED");
    }
}
