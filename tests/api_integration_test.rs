mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use http_body_util::BodyExt;
use movie_review_backend::entities::users::UserRole;
use movie_review_backend::{AppState, create_app};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> Router {
    let db = setup_test_db().await;
    create_user_with_password(&db, "admin", "adminpass", UserRole::Admin).await;
    create_app(AppState::new(db, test_config()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check_and_request_id() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn test_moderation_flow_over_http() {
    let app = setup_app().await;
    let user_token = register(&app, "uploader").await;
    let admin_token = login(&app, "admin", "adminpass").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let movie = json!({
        "title": "Arrival",
        "description": "Linguist meets heptapods.",
        "releaseYear": 2016,
        "durationMin": 116,
        "genreIds": []
    });

    let (status, body) = send(&app, "POST", "/api/movies", None, Some(movie.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, created) =
        send(&app, "POST", "/api/movies", Some(&user_token), Some(movie.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Pending");
    assert_eq!(created["averageScore"], 0.0);
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, "POST", "/api/movies", Some(&user_token), Some(movie)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, list) = send(&app, "GET", "/api/movies", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 0);

    let (status, _) = send(&app, "GET", &format!("/api/movies/{}", id), None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/movies/approve/{}", id),
        Some(&user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = send(
        &app,
        "PUT",
        &format!("/api/movies/approve/{}", id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "Approved");

    let (_, list) = send(&app, "GET", "/api/movies?q=arr", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Arrival");
}

#[tokio::test]
async fn test_review_rules_over_http() {
    let app = setup_app().await;
    let admin_token = login(&app, "admin", "adminpass").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    let reviewer_token = register(&app, "critic").await;

    let (status, movie) = send(
        &app,
        "POST",
        "/api/movies",
        Some(&admin_token),
        Some(json!({ "title": "Heat", "releaseYear": 1995, "durationMin": 170 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let movie_id = movie["id"].as_i64().unwrap();

    let review = json!({ "movieId": movie_id, "score": 9, "title": "Great", "body": "Shootout!" });
    let (status, _) = send(&app, "POST", "/api/reviews", Some(&reviewer_token), Some(review.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/reviews", Some(&reviewer_token), Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User has already reviewed this movie.");

    let (status, _) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(&reviewer_token),
        Some(json!({ "movieId": 9999, "score": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(&reviewer_token),
        Some(json!({ "movieId": movie_id, "score": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, reviews) = send(
        &app,
        "GET",
        &format!("/api/movies/{}/reviews", movie_id),
        None,
        None,
    )
    .await;
    assert_eq!(reviews["reviews"].as_array().unwrap().len(), 1);
    assert!(reviews["reviews"][0].get("body").is_none());

    let (_, reviews) = send(
        &app,
        "GET",
        &format!("/api/movies/{}/reviews?includeText=true", movie_id),
        None,
        None,
    )
    .await;
    assert_eq!(reviews["reviews"][0]["body"], "Shootout!");

    let (_, details) = send(&app, "GET", &format!("/api/movies/{}", movie_id), None, None).await;
    assert_eq!(details["averageScore"], 9.0);
}

#[tokio::test]
async fn test_token_rotation_over_http() {
    let app = setup_app().await;
    let tokens = login(&app, "admin", "adminpass").await;
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rotated["accessToken"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/revoke",
        None,
        Some(json!({ "refreshToken": rotated["refreshToken"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": rotated["refreshToken"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_administration_over_http() {
    let app = setup_app().await;
    let admin_token = login(&app, "admin", "adminpass").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    let user_token = register(&app, "member").await;

    let (status, me) = send(&app, "GET", "/api/users/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "member");
    assert_eq!(me["role"], "User");
    assert!(me.get("passwordHash").is_none());
    let member_id = me["id"].as_i64().unwrap();

    let (status, _) = send(&app, "GET", "/api/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, users) = send(&app, "GET", "/api/users?q=MEM", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/api/users/1", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", member_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted member's token no longer identifies anyone
    let (status, _) = send(&app, "GET", "/api/users/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_genre_management_over_http() {
    let app = setup_app().await;
    let admin_token = login(&app, "admin", "adminpass").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    let user_token = register(&app, "fan").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/genres",
        Some(&user_token),
        Some(json!({ "name": "Noir" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, genre) = send(
        &app,
        "POST",
        "/api/genres",
        Some(&admin_token),
        Some(json!({ "name": "Noir", "description": "Shadows and cynicism." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/genres",
        Some(&admin_token),
        Some(json!({ "name": "noir" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, genres) = send(&app, "GET", "/api/genres", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genres[0]["name"], "Noir");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/genres/{}", genre["id"]),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/genres/{}", genre["id"]),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"username": 5"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": 5, "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/movies/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/movies?genreId=drama", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_wildcards_match_literally_over_http() {
    let app = setup_app().await;
    let admin_token = login(&app, "admin", "adminpass").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    for name in ["Sci_Fi", "Comedy"] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/genres",
            Some(&admin_token),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, genres) = send(&app, "GET", "/api/genres?q=%25", None, None).await;
    assert!(genres.as_array().unwrap().is_empty());

    let (_, genres) = send(&app, "GET", "/api/genres?q=_", None, None).await;
    assert_eq!(genres.as_array().unwrap().len(), 1);
    assert_eq!(genres[0]["name"], "Sci_Fi");

    let (_, users) = send(&app, "GET", "/api/users?q=%25", Some(&admin_token), None).await;
    assert!(users.as_array().unwrap().is_empty());
}
