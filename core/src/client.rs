//! Client session for a PlantUML server.
//!
//! # Design
//! A `PlantUml` value only exists once configuration and authentication have
//! succeeded: `new`/`with_transport` either return a ready session or an
//! error, and there is no way back to an unconfigured state. What the
//! session learns while authenticating (the `Authorization` value for basic
//! auth, the cookie for form auth) is fixed at construction and only read
//! afterwards, so a session can be shared between threads when its transport
//! allows it.
//!
//! Each operation is split the same way: a pure `build_*` that produces an
//! `HttpRequest`, the transport round-trip, and a pure `parse_*` that
//! classifies the `HttpResponse`. `fetch` strings the three together.
//!
//! The form-login cookie is never refreshed. If the server expires it, later
//! fetches fail with the server's HTTP error and the caller has to build a
//! new session.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info, warn};
use url::form_urlencoded;
use url::Url;

use crate::config::{AuthMode, BasicAuth, FormAuth, ServerConfig};
use crate::encoding;
use crate::error::{HttpError, PlantUmlError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A configured, authenticated connection to a PlantUML server.
#[derive(Debug)]
pub struct PlantUml<T = UreqTransport> {
    base_url: String,
    transport: T,
    authorization: Option<String>,
    cookie: Option<String>,
}

impl PlantUml<UreqTransport> {
    /// Build a session over a `ureq` transport using `config.proxy`.
    pub fn new(config: ServerConfig) -> Result<Self, PlantUmlError> {
        let transport = UreqTransport::new(config.proxy.as_deref())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PlantUml<T> {
    /// Validate `config` and authenticate over `transport`.
    ///
    /// Basic auth makes no network call. Form auth posts the login form once
    /// and keeps the returned cookie for the life of the session.
    pub fn with_transport(config: ServerConfig, transport: T) -> Result<Self, PlantUmlError> {
        Url::parse(&config.url)
            .map_err(|e| PlantUmlError::Config(format!("invalid server url {:?}: {e}", config.url)))?;

        let mut session = Self {
            base_url: config.url,
            transport,
            authorization: None,
            cookie: None,
        };

        match &config.auth {
            AuthMode::None => {}
            AuthMode::Basic(credentials) => {
                session.authorization = Some(basic_authorization(credentials));
            }
            AuthMode::Form(form) => {
                let request = build_login_request(form)?;
                let response = session.transport.execute(&request)?;
                session.cookie = parse_login(response)?;
                info!(url = %request.url, "logged in to PlantUML server");
            }
        }

        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cookie captured by form login, replayed on every request.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// URL of the rendered image, usable directly in an `<img>` tag.
    pub fn build_url(&self, text: &str) -> String {
        image_url(&self.base_url, text)
    }

    pub fn build_request(&self, text: &str) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(authorization) = &self.authorization {
            headers.push(("Authorization".to_string(), authorization.clone()));
        }
        if let Some(cookie) = &self.cookie {
            headers.push(("Cookie".to_string(), cookie.clone()));
        }
        HttpRequest {
            method: HttpMethod::Get,
            url: self.build_url(text),
            headers,
            body: None,
        }
    }

    /// Return the image bytes of a 200 response, unexamined.
    pub fn parse_image(&self, response: HttpResponse) -> Result<Vec<u8>, PlantUmlError> {
        if response.status == 200 {
            return Ok(response.body);
        }
        Err(http_error(response).into())
    }

    /// Render `text` on the server and return the raw image bytes.
    pub fn fetch(&self, text: &str) -> Result<Vec<u8>, PlantUmlError> {
        let request = self.build_request(text);
        let response = self.transport.execute(&request)?;
        let result = self.parse_image(response);
        if let Err(err) = &result {
            debug!(url = %request.url, error = %err, "render failed");
        }
        result
    }
}

/// `base_url` followed by the encoded token of `text`.
pub fn image_url(base_url: &str, text: &str) -> String {
    format!("{base_url}{}", encoding::encode(text))
}

/// Build the login request for form auth, rejecting incomplete settings.
pub fn build_login_request(form: &FormAuth) -> Result<HttpRequest, PlantUmlError> {
    let url = form.url.as_deref().ok_or_else(|| {
        PlantUmlError::Config("form auth needs 'url' pointing at the login page".to_string())
    })?;
    let fields = form.body.as_ref().ok_or_else(|| {
        PlantUmlError::Config(
            "form auth needs 'body' with the login form fields, e.g. {\"username\": \"me\", \"password\": \"secret\"}"
                .to_string(),
        )
    })?;
    let method = match form.method.as_deref() {
        Some(method) => method.parse()?,
        None => HttpMethod::Post,
    };
    let headers = match &form.headers {
        Some(headers) => headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        None => vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
    };
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();

    Ok(HttpRequest {
        method,
        url: url.to_string(),
        headers,
        body: Some(body),
    })
}

/// Check the login response and extract the session cookie.
///
/// The `name=value` part of every `Set-Cookie` header is kept, joined with
/// `"; "` as a `Cookie` header value expects.
pub fn parse_login(response: HttpResponse) -> Result<Option<String>, PlantUmlError> {
    if !(200..300).contains(&response.status) {
        return Err(http_error(response).into());
    }

    let pairs: Vec<&str> = response
        .header_values("Set-Cookie")
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();

    if pairs.is_empty() {
        warn!("login succeeded but the server set no cookie");
        return Ok(None);
    }
    Ok(Some(pairs.join("; ")))
}

fn basic_authorization(credentials: &BasicAuth) -> String {
    let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
    format!("Basic {token}")
}

fn http_error(response: HttpResponse) -> HttpError {
    HttpError {
        status: response.status,
        reason: response.reason,
        body: response.body,
    }
}
