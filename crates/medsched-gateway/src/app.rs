use axum::{
    routing::{get, post, put},
    Router,
};
use medsched_auth::TokenSigner;
use medsched_core::config::MedschedConfig;
use medsched_store::Store;
use std::sync::Arc;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
///
/// The store here is the request-side handle; the reminder engine owns its
/// own `Store` over a separate connection.
pub struct AppState {
    pub config: MedschedConfig,
    pub store: Store,
    pub tokens: TokenSigner,
}

impl AppState {
    pub fn new(config: MedschedConfig, store: Store) -> Self {
        let tokens = TokenSigner::new(&config.auth.token_secret, config.auth.token_ttl_minutes);
        Self {
            config,
            store,
            tokens,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/appointments", post(crate::http::appointments::create))
        .route("/appointments/{id}", get(crate::http::appointments::get_one))
        .route(
            "/appointments/patient/{id}",
            get(crate::http::appointments::list_for_requester),
        )
        .route(
            "/appointments/doctor/{id}",
            get(crate::http::appointments::list_for_provider),
        )
        .route(
            "/appointments/{id}/cancel",
            put(crate::http::appointments::cancel),
        )
        .route(
            "/appointments/{id}/complete",
            put(crate::http::appointments::complete),
        )
        .route("/requesters", get(crate::http::requesters::list_all))
        .route("/requesters/register", post(crate::http::requesters::register))
        .route("/requesters/login", post(crate::http::requesters::login))
        .route(
            "/requesters/{id}",
            get(crate::http::requesters::get_one).put(crate::http::requesters::update),
        )
        .route("/providers/register", post(crate::http::providers::register))
        .route("/providers/login", post(crate::http::providers::login))
        .route(
            "/providers/{id}",
            get(crate::http::providers::get_one).put(crate::http::providers::update),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use medsched_core::config::MedschedConfig;
    use rusqlite::Connection;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Store::new(Connection::open_in_memory().unwrap()).unwrap();
        build_router(Arc::new(AppState::new(MedschedConfig::default(), store)))
    }

    fn request(method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Register + login one requester and one provider; returns
    /// (requester_id, requester_token, provider_id, provider_token).
    async fn onboarded(router: &Router) -> (String, String, String, String) {
        let (status, body) = send(
            router,
            request(
                "POST",
                "/requesters/register",
                None,
                Some(json!({
                    "name": "Ada Riley",
                    "birthDate": "1990-03-14",
                    "email": "ada@example.com",
                    "phone": "+1-555-0101",
                    "password": "correct-horse",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let requester_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            router,
            request(
                "POST",
                "/requesters/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "correct-horse" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let requester_token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(
            router,
            request(
                "POST",
                "/providers/register",
                None,
                Some(json!({
                    "name": "Dr. Flores",
                    "specialization": "Cardiology",
                    "email": "flores@example.com",
                    "phone": "+1-555-0202",
                    "password": "correct-horse",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let provider_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            router,
            request(
                "POST",
                "/providers/login",
                None,
                Some(json!({ "email": "flores@example.com", "password": "correct-horse" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let provider_token = body["token"].as_str().unwrap().to_string();

        (requester_id, requester_token, provider_id, provider_token)
    }

    async fn book(router: &Router, requester_id: &str, provider_id: &str, token: &str) -> String {
        let date = (chrono::Utc::now() + chrono::Duration::hours(48)).to_rfc3339();
        let (status, body) = send(
            router,
            request(
                "POST",
                "/appointments",
                Some(token),
                Some(json!({
                    "patientId": requester_id,
                    "doctorId": provider_id,
                    "date": date,
                    "reason": "checkup",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "scheduled");
        assert_eq!(body["doctorSpecialization"], "Cardiology");
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn book_complete_then_cancel_conflicts() {
        let router = test_router();
        let (rid, rtok, pid, ptok) = onboarded(&router).await;
        let aid = book(&router, &rid, &pid, &rtok).await;

        let (status, _) = send(
            &router,
            request("PUT", &format!("/appointments/{aid}/complete"), Some(&ptok), None),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &router,
            request("PUT", &format!("/appointments/{aid}/cancel"), Some(&rtok), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "cannot cancel a completed appointment");
    }

    #[tokio::test]
    async fn past_dated_booking_rejected_and_not_persisted() {
        let router = test_router();
        let (rid, rtok, pid, _) = onboarded(&router).await;

        let date = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        let (status, _) = send(
            &router,
            request(
                "POST",
                "/appointments",
                Some(&rtok),
                Some(json!({
                    "patientId": rid,
                    "doctorId": pid,
                    "date": date,
                    "reason": "checkup",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &router,
            request("GET", &format!("/appointments/patient/{rid}"), Some(&rtok), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn third_party_read_is_forbidden_not_not_found() {
        let router = test_router();
        let (rid, rtok, pid, _) = onboarded(&router).await;
        let aid = book(&router, &rid, &pid, &rtok).await;

        let (status, _) = send(
            &router,
            request(
                "POST",
                "/requesters/register",
                None,
                Some(json!({
                    "name": "Eve Moran",
                    "birthDate": "1992-07-01",
                    "email": "eve@example.com",
                    "phone": "+1-555-0303",
                    "password": "correct-horse",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = send(
            &router,
            request(
                "POST",
                "/requesters/login",
                None,
                Some(json!({ "email": "eve@example.com", "password": "correct-horse" })),
            ),
        )
        .await;
        let eve_token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            request("GET", &format!("/appointments/{aid}"), Some(&eve_token), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        // Fixed body: nothing about the appointment's existence or state.
        assert_eq!(body, json!({ "error": "forbidden" }));
    }

    #[tokio::test]
    async fn requester_cannot_complete() {
        let router = test_router();
        let (rid, rtok, pid, _) = onboarded(&router).await;
        let aid = book(&router, &rid, &pid, &rtok).await;

        let (status, _) = send(
            &router,
            request("PUT", &format!("/appointments/{aid}/complete"), Some(&rtok), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let router = test_router();
        let (status, _) = send(&router, request("GET", "/appointments/some-id", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_email_conflicts() {
        let router = test_router();
        let _ = onboarded(&router).await;
        let (status, _) = send(
            &router,
            request(
                "POST",
                "/requesters/register",
                None,
                Some(json!({
                    "name": "Ada Again",
                    "birthDate": "1990-03-14",
                    "email": "ada@example.com",
                    "phone": "+1-555-0101",
                    "password": "correct-horse",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let router = test_router();
        let _ = onboarded(&router).await;

        let (s1, b1) = send(
            &router,
            request(
                "POST",
                "/requesters/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "wrong" })),
            ),
        )
        .await;
        let (s2, b2) = send(
            &router,
            request(
                "POST",
                "/requesters/login",
                None,
                Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
            ),
        )
        .await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!((s1, b1), (s2, b2));
    }
}
