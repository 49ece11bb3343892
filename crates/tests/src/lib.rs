//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置驱动的完整服务装配 (file sink)
//! - 用户 API 端到端流程及其副作用
//! - 限流、观测计数与关闭排空

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DispatchPayload, PayloadKind, RateLimitConfig, ServiceBlueprint};
    use dispatcher::{Dispatcher, MemoryCapture};
    use observability::find_sample;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use user_service::{Dispatchers, Service};

    /// Service wired to in-memory sinks
    struct Harness {
        service: Service,
        audit: MemoryCapture,
        notifications: MemoryCapture,
        errors: MemoryCapture,
    }

    impl Harness {
        fn new(rate_limit: RateLimitConfig) -> Self {
            let audit = MemoryCapture::new();
            let notifications = MemoryCapture::new();
            let errors = MemoryCapture::new();
            let dispatchers = Dispatchers::new(
                Dispatcher::spawn(audit.sink("audit"), Arc::new(audit.clone()), 256),
                Dispatcher::spawn(
                    notifications.sink("notifications"),
                    Arc::new(notifications.clone()),
                    256,
                ),
                Dispatcher::spawn(errors.sink("errors"), Arc::new(errors.clone()), 256),
            );
            let blueprint = ServiceBlueprint {
                rate_limit,
                ..Default::default()
            };
            Self {
                service: Service::assemble(&blueprint, dispatchers).unwrap(),
                audit,
                notifications,
                errors,
            }
        }

        fn router(&self) -> Router {
            self.service.router.clone()
        }

        async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        /// Drain everything and hand back the captures
        async fn finish(self) -> (MemoryCapture, MemoryCapture, MemoryCapture) {
            let reports = self
                .service
                .dispatchers
                .shutdown(Duration::from_secs(2))
                .await;
            assert!(reports.iter().all(|r| r.completed));
            let names: Vec<&str> = reports.iter().map(|r| r.dispatcher.as_str()).collect();
            assert_eq!(names, vec!["audit", "notifications", "errors"]);
            (self.audit, self.notifications, self.errors)
        }
    }

    fn actions(payloads: &[DispatchPayload]) -> Vec<String> {
        payloads
            .iter()
            .map(|p| match &p.kind {
                PayloadKind::Audit { action } => action.clone(),
                PayloadKind::Notification { category } => category.clone(),
                PayloadKind::Error { operation, .. } => operation.clone(),
            })
            .collect()
    }

    fn ada() -> Value {
        json!({ "name": "  Ada Lovelace ", "email": "Ada@Example.com" })
    }

    #[tokio::test]
    async fn test_e2e_user_lifecycle() {
        let harness = Harness::new(RateLimitConfig::default());

        let (status, created) = harness.call(Method::POST, "/api/users", Some(ada())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["name"], "Ada Lovelace");
        assert_eq!(created["email"], "ada@example.com");

        let (status, listed) = harness.call(Method::GET, "/api/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, fetched) = harness.call(Method::GET, "/api/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let update = json!({ "name": "Ada King", "email": "ada@king.org" });
        let (status, updated) = harness
            .call(Method::PUT, "/api/users/1", Some(update))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["name"], "Ada King");

        let (status, deleted) = harness.call(Method::DELETE, "/api/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["message"], "User deleted successfully");

        let (audit, notifications, errors) = harness.finish().await;
        assert_eq!(
            actions(&audit.written()),
            vec!["CREATE", "LIST_USERS", "GET_USER", "UPDATE", "DELETE"]
        );
        assert_eq!(
            actions(&notifications.written()),
            vec!["WELCOME", "PROFILE_UPDATED", "ACCOUNT_DELETED"]
        );
        assert!(notifications
            .written()
            .iter()
            .all(|p| p.subject_id == Some(1)));
        assert!(errors.written().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_not_found_paths_are_audited() {
        let harness = Harness::new(RateLimitConfig::default());

        for method in [Method::GET, Method::DELETE] {
            let (status, body) = harness.call(method, "/api/users/42", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "Not Found");
            assert_eq!(body["message"], "User not found");
        }
        let update = json!({ "name": "Grace", "email": "grace@example.com" });
        let (status, _) = harness
            .call(Method::PUT, "/api/users/42", Some(update))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (audit, notifications, _) = harness.finish().await;
        let written = audit.written();
        assert_eq!(
            actions(&written),
            vec![
                "GET_USER_NOT_FOUND",
                "DELETE_USER_NOT_FOUND",
                "UPDATE_USER_NOT_FOUND"
            ]
        );
        assert!(written
            .iter()
            .all(|p| p.subject_id == Some(42) && p.context == "user not found"));
        assert!(notifications.written().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_bad_requests_record_errors() {
        let harness = Harness::new(RateLimitConfig::default());

        let (status, body) = harness.call(Method::GET, "/api/users/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid user ID");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = harness.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let invalid = json!({ "name": "A", "email": "a@example.com" });
        let (status, body) = harness
            .call(Method::POST, "/api/users", Some(invalid))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], "name must be at least 2 characters");

        let (audit, _, errors) = harness.finish().await;
        assert!(audit.written().is_empty());
        let records = errors.written();
        assert_eq!(
            actions(&records),
            vec!["get_user", "create_user", "create_user"]
        );
        let contexts: Vec<&str> = records.iter().map(|p| p.context.as_str()).collect();
        assert_eq!(
            contexts,
            vec![
                "invalid user ID format",
                "failed to decode request body",
                "validation failed"
            ]
        );
    }

    #[tokio::test]
    async fn test_e2e_single_not_found_counted_once() {
        let harness = Harness::new(RateLimitConfig::default());
        let telemetry = Arc::clone(&harness.service.state.telemetry);

        let (status, _) = harness.call(Method::GET, "/api/users/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, scrape) = {
            let request = Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap();
            let response = harness.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        };
        assert_eq!(status, StatusCode::OK);

        let route = ("route", "/api/users/:id");
        assert_eq!(
            find_sample(&scrape, "http_requests_total", &[route, ("status", "404")]),
            Some(1.0)
        );
        assert_eq!(
            find_sample(&scrape, "http_errors_total", &[route, ("class", "client")]),
            Some(1.0)
        );
        assert_eq!(find_sample(&scrape, "http_requests_in_flight", &[]), Some(0.0));
        // the scrape itself is not observed
        assert_eq!(
            find_sample(&scrape, "http_requests_total", &[("route", "/metrics")]),
            None
        );
        assert_eq!(
            find_sample(&telemetry.render(), "http_requests_total", &[("route", "/metrics")]),
            None
        );

        harness.finish().await;
    }

    #[tokio::test]
    async fn test_e2e_rate_limit() {
        let harness = Harness::new(RateLimitConfig::new(0.001, 2));

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let (status, _) = harness.call(Method::GET, "/api/health", None).await;
            statuses.push(status);
        }
        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );

        let rendered = harness.service.state.telemetry.render();
        assert_eq!(find_sample(&rendered, "rate_limit_hits_total", &[]), Some(1.0));

        let (_, _, errors) = harness.finish().await;
        let records = errors.written();
        assert_eq!(actions(&records), vec!["rate_limit"]);
        assert_eq!(records[0].context, "Rate limit exceeded for request: /api/health");
    }

    #[tokio::test]
    async fn test_e2e_rate_limit_reconfigured_live() {
        let harness = Harness::new(RateLimitConfig::new(0.001, 1));

        let (status, _) = harness.call(Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = harness.call(Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let gate = harness.service.admission.gate();
        gate.reconfigure(RateLimitConfig::new(0.001, 3));
        assert_eq!(gate.config().burst, 3);

        let mut statuses = Vec::new();
        for _ in 0..4 {
            let (status, _) = harness.call(Method::GET, "/api/health", None).await;
            statuses.push(status);
        }
        assert_eq!(
            statuses,
            vec![
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::TOO_MANY_REQUESTS
            ]
        );

        let (_, _, errors) = harness.finish().await;
        assert_eq!(actions(&errors.written()), vec!["rate_limit", "rate_limit"]);
    }

    #[tokio::test]
    async fn test_e2e_health_reports_dispatchers() {
        let harness = Harness::new(RateLimitConfig::default());
        harness.call(Method::POST, "/api/users", Some(ada())).await;

        let (status, body) = harness.call(Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
        for name in ["audit", "notifications", "errors"] {
            assert!(body["dispatchers"][name]["pending"].is_number());
        }

        harness.finish().await;
    }

    #[tokio::test]
    async fn test_e2e_config_driven_file_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("audit.log");
        let errors_path = dir.path().join("errors.log");
        let config = format!(
            r#"
[server]
port = 0

[dispatch]
drain_timeout_secs = 5

[dispatch.audit]
name = "audit"
sink_type = "file"
params = {{ path = "{}" }}

[dispatch.notifications]
name = "notifications"
sink_type = "log"

[dispatch.errors]
name = "errors"
sink_type = "file"
params = {{ path = "{}" }}
"#,
            audit_path.display(),
            errors_path.display()
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();
        let service = Service::build(&blueprint).await.unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header("content-type", "application/json")
            .body(Body::from(ada().to_string()))
            .unwrap();
        let response = service.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .uri("/api/users/zero")
            .body(Body::empty())
            .unwrap();
        let response = service.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let reports = service.dispatchers.shutdown(blueprint.dispatch.drain_timeout()).await;
        assert!(reports.iter().all(|r| r.completed));

        let audit = std::fs::read_to_string(&audit_path).unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.starts_with("action=CREATE | user_id=1 | details= | time="));

        let errors = std::fs::read_to_string(&errors_path).unwrap();
        assert!(errors.starts_with("operation=get_user | error=invalid digit found in string"));
    }
}
