//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Account
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/me", get(handlers::user::me))
        .route("/me/name", put(handlers::user::rename))
        .route("/me/password", put(handlers::user::change_password))
        .route("/users/{id}", get(handlers::user::get_user))
        // Conversations
        .route(
            "/chats",
            get(handlers::chat::list_chats).post(handlers::chat::start_chat),
        )
        .route(
            "/chats/{id}/messages",
            get(handlers::chat::get_messages).post(handlers::chat::send_message),
        )
        .route("/chats/{id}/read", post(handlers::chat::mark_read))
        // Discovery
        .route("/contacts", get(handlers::contact::list_contacts));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, Response, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(resp: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `name=value` part of the response's `Set-Cookie`.
    fn cookie_of(resp: &Response<Body>) -> String {
        let header = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        header.split(';').next().unwrap().to_string()
    }

    async fn signup(app: &Router, name: &str, email: &str) -> (String, String) {
        let resp = send(
            app,
            "POST",
            "/api/v1/signup",
            None,
            Some(json!({"name": name, "email": email, "password": "correct horse"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let cookie = cookie_of(&resp);
        let json = json_body(resp).await;
        (json["data"]["id"].as_str().unwrap().to_string(), cookie)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(AppState::in_memory());
        let resp = send(&app, "GET", "/health", None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let app = build_router(AppState::in_memory());
        for uri in ["/api/v1/me", "/api/v1/chats", "/api/v1/contacts"] {
            let resp = send(&app, "GET", uri, None, None).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let json = json_body(resp).await;
            assert_eq!(json["errors"][0]["code"], "UNAUTHENTICATED");
            assert_eq!(json["_links"]["login"], "/api/v1/login");
        }

        let resp = send(&app, "GET", "/api/v1/me", Some("session_id=forged"), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_sets_cookie_and_me_returns_user() {
        let app = build_router(AppState::in_memory());
        let resp = send(
            &app,
            "POST",
            "/api/v1/signup",
            None,
            Some(json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "correct horse"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let set_cookie = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("session_id="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Max-Age=2592000"));

        let cookie = cookie_of(&resp);
        let resp = send(&app, "GET", "/api/v1/me", Some(&cookie), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["data"]["name"], "Alice");
        assert_eq!(json["data"]["email"], "alice@example.com");
        assert!(json["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let app = build_router(AppState::in_memory());
        signup(&app, "Alice", "alice@example.com").await;
        let resp = send(
            &app,
            "POST",
            "/api/v1/signup",
            None,
            Some(json!({
                "name": "Other",
                "email": "alice@example.com",
                "password": "correct horse"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["errors"][0]["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let app = build_router(AppState::in_memory());
        signup(&app, "Alice", "alice@example.com").await;

        let resp = send(
            &app,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong password"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["errors"][0]["code"], "INVALID_CREDENTIALS");

        let resp = send(
            &app,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "correct horse"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = cookie_of(&resp);

        let resp = send(&app, "POST", "/api/v1/logout", Some(&cookie), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cleared = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let resp = send(&app, "GET", "/api/v1/me", Some(&cookie), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_leaves_user_offline() {
        let state = AppState::in_memory();
        let app = build_router(state.clone());
        let (alice_id, alice) = signup(&app, "Alice", "alice@example.com").await;

        let resp = send(&app, "GET", "/api/v1/me", Some(&alice), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(state.users.get_user(&alice_id).await.unwrap().is_online);

        let resp = send(&app, "POST", "/api/v1/logout", Some(&alice), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!state.users.get_user(&alice_id).await.unwrap().is_online);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let app = build_router(AppState::in_memory());
        signup(&app, "Alice", "alice@example.com").await;

        let resp = send(
            &app,
            "POST",
            "/api/v1/reset-password",
            None,
            Some(json!({
                "email": "nobody@example.com",
                "password": "brand new pw",
                "password_confirm": "brand new pw"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(
            &app,
            "POST",
            "/api/v1/reset-password",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "brand new pw",
                "password_confirm": "mismatch"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            "POST",
            "/api/v1/reset-password",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "brand new pw",
                "password_confirm": "brand new pw"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(
            &app,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "brand new pw"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_conversation_flow() {
        let app = build_router(AppState::in_memory());
        let (_alice_id, alice) = signup(&app, "Alice", "alice@example.com").await;
        let (bob_id, bob) = signup(&app, "Bob", "bob@example.com").await;

        // Bob is a contact candidate until a chat exists.
        let resp = send(&app, "GET", "/api/v1/contacts?q=bo", Some(&alice), None).await;
        let json = json_body(resp).await;
        assert_eq!(json["data"][0]["id"], bob_id.as_str());

        let start = json!({"user_id": bob_id});
        let resp = send(&app, "POST", "/api/v1/chats", Some(&alice), Some(start)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let chat_id = json_body(resp).await["data"]["chat_id"].as_str().unwrap().to_string();

        let messages_uri = format!("/api/v1/chats/{chat_id}/messages");
        let body = json!({"content": "hi bob"});
        let resp = send(&app, "POST", &messages_uri, Some(&alice), Some(body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&app, "GET", "/api/v1/chats", Some(&bob), None).await;
        let json = json_body(resp).await;
        let chats = json["data"].as_array().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["contact"]["name"], "Alice");
        assert_eq!(chats[0]["messages"][0]["content"], "hi bob");

        let read_uri = format!("/api/v1/chats/{chat_id}/read");
        let resp = send(&app, "POST", &read_uri, Some(&bob), None).await;
        assert_eq!(json_body(resp).await["data"]["updated"], 1);

        let resp = send(&app, "GET", "/api/v1/contacts", Some(&alice), None).await;
        assert!(json_body(resp).await["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_chat() {
        let app = build_router(AppState::in_memory());
        let (_, alice) = signup(&app, "Alice", "alice@example.com").await;
        let (bob_id, _) = signup(&app, "Bob", "bob@example.com").await;
        let (_, carol) = signup(&app, "Carol", "carol@example.com").await;

        let start = json!({"user_id": bob_id});
        let resp = send(&app, "POST", "/api/v1/chats", Some(&alice), Some(start)).await;
        let chat_id = json_body(resp).await["data"]["chat_id"].as_str().unwrap().to_string();

        let messages_uri = format!("/api/v1/chats/{chat_id}/messages");
        let resp = send(&app, "GET", &messages_uri, Some(&carol), None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rename_refreshes_session() {
        let app = build_router(AppState::in_memory());
        let (_, alice) = signup(&app, "Alice", "alice@example.com").await;

        let body = json!({"name": "Alicia"});
        let resp = send(&app, "PUT", "/api/v1/me/name", Some(&alice), Some(body)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, "GET", "/api/v1/me", Some(&alice), None).await;
        assert_eq!(json_body(resp).await["data"]["name"], "Alicia");

        let body = json!({"name": "A"});
        let resp = send(&app, "PUT", "/api/v1/me/name", Some(&alice), Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
