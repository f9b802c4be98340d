//! End-to-end tests driving the router in-process against an in-memory
//! database.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use blogger_api::config::AppConfig;
use blogger_api::routes::router;
use blogger_api::state::AppStateInner;
use blogger_db::Database;

const PASSWORD: &str = "Password1";

struct TestApp {
    router: Router,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    /// `name=value` part of the refresh cookie, ready to send back.
    fn refresh_cookie(&self) -> String {
        let raw = self
            .headers
            .get(header::SET_COOKIE)
            .expect("no Set-Cookie header")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    fn set_cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default()
    }
}

struct Session {
    id: String,
    access_token: String,
    cookie: String,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let config = AppConfig::new("test-access-secret", "test-refresh-secret").unwrap();
        Self {
            router: router(AppStateInner::new(db, config)),
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json_body) => builder
                .body(Body::from(serde_json::to_string(&json_body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn register(&self, username: &str) -> Session {
        let res = self
            .send(
                "POST",
                "/auth/register",
                Some(json!({
                    "username": username,
                    "password": PASSWORD,
                    "email": format!("{username}@example.com"),
                })),
                None,
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        Session {
            id: res.body["id"].as_str().unwrap().to_string(),
            access_token: res.body["accessToken"].as_str().unwrap().to_string(),
            cookie: res.refresh_cookie(),
        }
    }

    async fn create_post(&self, author: &Session, title: &str) -> String {
        let res = self
            .send(
                "POST",
                "/api/blogs",
                Some(json!({ "title": title, "content": "body" })),
                Some(&author.access_token),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["id"].as_str().unwrap().to_string()
    }
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn register_sets_refresh_cookie() {
    let app = TestApp::new();
    let res = app
        .send(
            "POST",
            "/auth/register",
            Some(json!({
                "username": "alice",
                "password": PASSWORD,
                "email": "alice@example.com",
                "bio": "hi",
            })),
            None,
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["accessToken"].is_string());
    assert_eq!(res.body["username"], "alice");

    let cookie = res.set_cookie();
    assert!(cookie.starts_with("refreshToken="), "{cookie}");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=432000"));
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let app = TestApp::new();

    let res = app
        .send("POST", "/auth/register", Some(json!({ "username": "alice" })), None, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Missing fields");

    let res = app
        .send(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice", "password": PASSWORD, "email": "nope" })),
            None,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "invalid email address");

    let res = app
        .send(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice", "password": "password", "email": "a@x.com" })),
            None,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "invalid password format");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("alice").await;

    let res = app
        .send(
            "POST",
            "/auth/register",
            Some(json!({
                "username": "alice",
                "password": PASSWORD,
                "email": "other@example.com",
            })),
            None,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_checks_password() {
    let app = TestApp::new();
    app.register("alice").await;

    let res = app
        .send(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": "Wrong1234" })),
            None,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": PASSWORD })),
            None,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie().contains("Max-Age=432000"));
}

#[tokio::test]
async fn refresh_then_logout() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let res = app.send("POST", "/auth/refresh", None, None, None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "missing token");

    let res = app
        .send("POST", "/auth/refresh", None, None, Some(&alice.cookie))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let refreshed = Session {
        id: alice.id.clone(),
        access_token: res.body["accessToken"].as_str().unwrap().to_string(),
        cookie: alice.cookie.clone(),
    };

    // The minted token works on a protected route.
    app.create_post(&refreshed, "fresh").await;

    let res = app
        .send("POST", "/auth/logout", None, None, Some(&alice.cookie))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "user logged out");

    let res = app
        .send("POST", "/auth/refresh", None, None, Some(&alice.cookie))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let cookie = format!("refreshToken={}", alice.access_token);
    let res = app
        .send("POST", "/auth/refresh", None, None, Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid token");
}

#[tokio::test]
async fn guest_refresh_ends_the_guest() {
    let app = TestApp::new();
    let res = app.send("POST", "/auth/guest", None, None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie().contains("Max-Age=86400"));
    assert!(res.body["username"].as_str().unwrap().starts_with("Guest"));

    let guest_id = res.body["id"].as_str().unwrap().to_string();
    let cookie = res.refresh_cookie();

    let res = app
        .send("GET", &format!("/api/user/id/{guest_id}"), None, None, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["isGuest"], true);

    let res = app
        .send("POST", "/auth/refresh", None, None, Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "guest session expired");

    let res = app
        .send("GET", &format!("/api/user/id/{guest_id}"), None, None, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guest_logout_releases_likes() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let post_id = app.create_post(&bobby, "hello").await;

    let guest = app.send("POST", "/auth/guest", None, None, None).await;
    let token = guest.body["accessToken"].as_str().unwrap().to_string();
    let cookie = guest.refresh_cookie();

    let res = app
        .send("PUT", &format!("/api/blogs/{post_id}/like"), None, Some(&token), None)
        .await;
    assert_eq!(res.body["likes"], 1);

    let res = app
        .send("POST", "/auth/logout", None, None, Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "guest user logged out");

    let res = app
        .send("GET", &format!("/api/blogs/{post_id}"), None, None, None)
        .await;
    assert_eq!(res.body["likes"], 0);
    assert_eq!(res.body["likedUsers"], json!([]));
}

// =============================================================================
// Engagement
// =============================================================================

#[tokio::test]
async fn like_toggles() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let alice = app.register("alice").await;
    let post_id = app.create_post(&bobby, "hello").await;
    let like = format!("/api/blogs/{post_id}/like");

    let res = app
        .send("PUT", &like, None, Some(&alice.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["likes"], 1);
    assert_eq!(res.body["likedUsers"], json!([alice.id]));

    let res = app
        .send("GET", &format!("/api/user/id/{}", alice.id), None, None, None)
        .await;
    assert_eq!(res.body["likedBlogs"][0]["id"], post_id.as_str());

    let res = app
        .send("PUT", &like, None, Some(&alice.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["likes"], 0);
    assert_eq!(res.body["likedUsers"], json!([]));

    let res = app
        .send("GET", &format!("/api/user/id/{}", alice.id), None, None, None)
        .await;
    assert_eq!(res.body["likedBlogs"], json!([]));
}

#[tokio::test]
async fn like_requires_bearer() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let post_id = app.create_post(&bobby, "hello").await;

    let res = app
        .send("PUT", &format!("/api/blogs/{post_id}/like"), None, None, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .send("PUT", &format!("/api/blogs/{post_id}/like"), None, Some("garbage"), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_and_missing_ids_differ() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let res = app
        .send("PUT", "/api/blogs/not-an-id/like", None, Some(&alice.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "malformatted id");

    let missing = uuid::Uuid::new_v4();
    let res = app
        .send("PUT", &format!("/api/blogs/{missing}/like"), None, Some(&alice.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_notifies_and_dismiss_removes() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let carol = app.register("carol").await;
    let post_id = app.create_post(&bobby, "hello").await;

    let res = app
        .send(
            "PUT",
            &format!("/api/blogs/{post_id}/comments"),
            Some(json!({ "comment": "" })),
            Some(&carol.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(
            "PUT",
            &format!("/api/blogs/{post_id}/comments"),
            Some(json!({ "comment": "nice post" })),
            Some(&carol.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["comments"][0]["comment"], "nice post");
    assert_eq!(res.body["comments"][0]["username"], "carol");

    let inbox = format!("/api/user/id/{}/notification", bobby.id);
    let res = app
        .send("GET", &inbox, None, Some(&bobby.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let notifications = res.body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0]["message"].as_str().unwrap().contains("carol"));
    assert_eq!(notifications[0]["read"], false);
    let notification_id = notifications[0]["id"].as_str().unwrap().to_string();

    let res = app
        .send(
            "PUT",
            &format!("{inbox}/{notification_id}/read"),
            None,
            Some(&bobby.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["read"], true);

    let res = app
        .send(
            "DELETE",
            &format!("{inbox}/{notification_id}"),
            None,
            Some(&bobby.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .send("GET", &inbox, None, Some(&bobby.access_token), None)
        .await;
    assert_eq!(res.body["notifications"], json!([]));
}

#[tokio::test]
async fn comment_ignores_extra_fields() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let carol = app.register("carol").await;
    let post_id = app.create_post(&bobby, "hello").await;

    let res = app
        .send(
            "PUT",
            &format!("/api/blogs/{post_id}/comments"),
            Some(json!({ "comment": "hi", "username": "someoneelse" })),
            Some(&carol.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["comments"][0]["comment"], "hi");
    assert_eq!(res.body["comments"][0]["username"], "carol");
}

#[tokio::test]
async fn any_user_can_dismiss_a_notification() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let carol = app.register("carol").await;
    let post_id = app.create_post(&bobby, "hello").await;

    app.send(
        "PUT",
        &format!("/api/blogs/{post_id}/like"),
        None,
        Some(&carol.access_token),
        None,
    )
    .await;

    let inbox = format!("/api/user/id/{}/notification", bobby.id);
    let res = app
        .send("GET", &inbox, None, Some(&bobby.access_token), None)
        .await;
    let notification_id = res.body["notifications"][0]["id"].as_str().unwrap().to_string();

    // Dismissal is keyed on the notification alone, not on whose list it is in.
    let res = app
        .send(
            "DELETE",
            &format!("/api/user/id/{}/notification/{notification_id}", carol.id),
            None,
            Some(&carol.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .send("GET", &inbox, None, Some(&bobby.access_token), None)
        .await;
    assert_eq!(res.body["notifications"], json!([]));
}

// =============================================================================
// Posts and profiles
// =============================================================================

#[tokio::test]
async fn only_author_can_delete() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let alice = app.register("alice").await;
    let post_id = app.create_post(&bobby, "hello").await;
    let uri = format!("/api/blogs/{post_id}");

    let res = app
        .send("DELETE", &uri, None, Some(&alice.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .send("DELETE", &uri, None, Some(&bobby.access_token), None)
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.send("GET", &uri, None, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_cannot_touch_likes() {
    let app = TestApp::new();
    let bobby = app.register("bobby").await;
    let post_id = app.create_post(&bobby, "hello").await;

    let res = app
        .send(
            "PUT",
            &format!("/api/blogs/{post_id}/edit"),
            Some(json!({ "title": "renamed", "likes": 99 })),
            Some(&bobby.access_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "renamed");
    assert_eq!(res.body["content"], "body");
    assert_eq!(res.body["likes"], 0);
}

#[tokio::test]
async fn profiles_hide_password() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    app.create_post(&alice, "hello").await;

    let res = app.send("GET", "/api/user/alice", None, None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], alice.id.as_str());
    assert_eq!(res.body["blogs"][0]["title"], "hello");
    assert!(res.body.get("password").is_none());

    let res = app.send("GET", "/api/user", None, None, None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.send("GET", "/api/user/nobody", None, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_endpoint() {
    let app = TestApp::new();
    let res = app.send("GET", "/nowhere", None, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "unknown endpoint");
}
