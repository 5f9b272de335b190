use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, BASIC_AUTHORIZATION, IMAGE_BYTES, NOT_FOUND_PAGE, SESSION_COOKIE};
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn get_with(uri: &str, name: http::header::HeaderName, value: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(name, value)
        .body(String::new())
        .unwrap()
}

fn form_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- render ---

#[tokio::test]
async fn render_returns_image_bytes() {
    let resp = app().oneshot(get("/plantuml/img/SoWkIImgAStDuN98pKi1qW00")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(resp).await, IMAGE_BYTES);
}

#[tokio::test]
async fn echo_returns_token() {
    let resp = app().oneshot(get("/echo/SyfFKj2rKt3CoKnELR1Io4ZDoSa70000")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "SyfFKj2rKt3CoKnELR1Io4ZDoSa70000");
}

#[tokio::test]
async fn missing_returns_404_page() {
    let resp = app().oneshot(get("/missing/img/abcd")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, NOT_FOUND_PAGE);
}

// --- basic auth ---

#[tokio::test]
async fn basic_render_requires_credentials() {
    let resp = app().oneshot(get("/basic/img/abcd")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(http::header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn basic_render_accepts_credentials() {
    let resp = app()
        .oneshot(get_with("/basic/img/abcd", http::header::AUTHORIZATION, BASIC_AUTHORIZATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, IMAGE_BYTES);
}

// --- form login ---

#[tokio::test]
async fn login_sets_session_cookie() {
    let resp = app().oneshot(form_request("username=me&password=secret")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[http::header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with(SESSION_COOKIE), "{cookie}");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let resp = app().oneshot(form_request("username=me&password=nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().get(http::header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_requires_form_content_type() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .body("username=me&password=secret".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- session ---

#[tokio::test]
async fn session_render_requires_cookie() {
    let resp = app().oneshot(get("/session/img/abcd")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app()
        .oneshot(get_with("/session/img/abcd", http::header::COOKIE, "lang=en; session=abc123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, IMAGE_BYTES);
}
