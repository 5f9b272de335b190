//! Stub PlantUML server for exercising the client over real HTTP.
//!
//! Routes:
//! - `GET /plantuml/img/{token}` renders every diagram as [`IMAGE_BYTES`].
//! - `GET /echo/{token}` answers with the token itself.
//! - `GET /missing/img/{token}` always answers 404 with [`NOT_FOUND_PAGE`].
//! - `GET /basic/img/{token}` requires [`BASIC_AUTHORIZATION`].
//! - `POST /login` accepts the form `username=me&password=secret` and sets
//!   [`SESSION_COOKIE`].
//! - `GET /session/img/{token}` requires the session cookie.

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

pub const IMAGE_BYTES: &[u8] = b"PNGDATA";
pub const NOT_FOUND_PAGE: &str = "<html><body><h1>404</h1>No such diagram</body></html>";

pub const USERNAME: &str = "me";
pub const PASSWORD: &str = "secret";
/// `Basic base64("me:secret")`
pub const BASIC_AUTHORIZATION: &str = "Basic bWU6c2VjcmV0";
pub const SESSION_COOKIE: &str = "session=abc123";

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/plantuml/img/{token}", get(render))
        .route("/echo/{token}", get(echo))
        .route("/missing/img/{token}", get(missing))
        .route("/basic/img/{token}", get(render_basic))
        .route("/login", post(login))
        .route("/session/img/{token}", get(render_session))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn image() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"plantuml\"")],
        "unauthorized",
    )
        .into_response()
}

async fn render(Path(_token): Path<String>) -> Response {
    image()
}

async fn echo(Path(token): Path<String>) -> String {
    token
}

async fn missing(Path(_token): Path<String>) -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}

async fn render_basic(headers: HeaderMap, Path(_token): Path<String>) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if authorization == Some(BASIC_AUTHORIZATION) {
        image()
    } else {
        unauthorized()
    }
}

async fn login(Form(input): Form<Login>) -> Response {
    if input.username == USERNAME && input.password == PASSWORD {
        let cookie = format!("{SESSION_COOKIE}; Path=/; HttpOnly");
        (StatusCode::OK, [(header::SET_COOKIE, cookie)], "welcome").into_response()
    } else {
        (StatusCode::FORBIDDEN, "bad credentials").into_response()
    }
}

async fn render_session(headers: HeaderMap, Path(_token): Path<String>) -> Response {
    let has_session = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim() == SESSION_COOKIE);
    if has_session {
        image()
    } else {
        unauthorized()
    }
}
