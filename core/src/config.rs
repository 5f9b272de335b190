//! Server configuration: base URL, authentication mode, and proxy.
//!
//! # Design
//! Everything a session needs is resolved into `ServerConfig` before the
//! session is built. In particular the proxy is read from the environment
//! once, through [`ServerConfig::with_env_proxy`], and the transport is then
//! built with exactly that value. Optional settings are `Option` fields so
//! that "not given" is distinct from "empty", and no default is shared
//! between instances.
//!
//! The struct deserializes from JSON:
//!
//! ```json
//! { "url": "http://localhost:8080/plantuml/img/",
//!   "auth": { "type": "basic", "username": "me", "password": "secret" },
//!   "proxy": "http://proxy.internal:3128" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::PlantUmlError;

pub const DEFAULT_SERVER_URL: &str = "http://www.plantuml.com/plantuml/img/";

/// Environment variables consulted for a proxy, in order of preference.
pub const PROXY_ENV_VARS: [&str; 2] = ["HTTPS_PROXY", "HTTP_PROXY"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Base URL the encoded token is appended to, e.g. `.../plantuml/img/`.
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default)]
    pub auth: AuthMode,
    /// Proxy as `scheme://host:port`. `None` means a direct connection.
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl ServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: AuthMode::None,
            proxy: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PlantUmlError> {
        serde_json::from_str(json).map_err(|e| PlantUmlError::Config(format!("invalid server config: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlantUmlError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PlantUmlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMode::Basic(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_form_auth(mut self, form: FormAuth) -> Self {
        self.auth = AuthMode::Form(form);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Resolve the proxy from `HTTPS_PROXY`, falling back to `HTTP_PROXY`.
    pub fn with_env_proxy(self) -> Self {
        self.with_proxy_from(|var| std::env::var(var).ok())
    }

    /// Resolve the proxy through `lookup` instead of the process environment.
    pub fn with_proxy_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.proxy = resolve_proxy(lookup);
        self
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

/// How a session authenticates. The variants are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    Basic(BasicAuth),
    Form(FormAuth),
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookie-based login through a web form.
///
/// `url` and `body` are required; they are `Option`s so that a config with
/// either one missing can still be represented and rejected at session
/// construction. `method` defaults to `POST` and `headers` to a form
/// `Content-Type`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormAuth {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Field names are shown, values are not: the body usually carries the password.
impl fmt::Debug for FormAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .body
            .as_ref()
            .map(|body| body.keys().map(|key| (key.as_str(), "<redacted>")).collect::<BTreeMap<_, _>>());
        f.debug_struct("FormAuth")
            .field("url", &self.url)
            .field("body", &body)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .finish()
    }
}

impl FormAuth {
    pub fn new<K, V>(url: impl Into<String>, body: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            url: Some(url.into()),
            body: Some(body.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            method: None,
            headers: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }
}

/// Pick the first usable proxy among [`PROXY_ENV_VARS`].
///
/// Only scheme, host and port are kept. A value that does not parse as a URL
/// is skipped with a warning; absence of every variable is not an error.
pub fn resolve_proxy(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let (var, raw) = PROXY_ENV_VARS.iter().find_map(|var| {
        lookup(var)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (*var, value))
    })?;

    let proxy = proxy_authority(raw.trim());
    if proxy.is_none() {
        warn!(var, value = %raw, "ignoring unusable proxy setting");
    }
    proxy
}

fn proxy_authority(raw: &str) -> Option<String> {
    // `host:port` without a scheme would parse as an opaque URL with no host.
    let parsed = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port_or_known_default()?;
    Some(format!("{}://{host}:{port}", parsed.scheme()))
}
