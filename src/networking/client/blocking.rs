//! Blocking HTTP transport for the MediaWiki action API

use crate::errors::{Result, TransportError, WikiError};
use crate::networking::auth::LoginState;
use crate::params::Values;
use crate::utils::lock;
use log::{debug, warn};
use reqwest::Url;
use reqwest::blocking::{Client as HttpClient, ClientBuilder, RequestBuilder};
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// User agent sent when the caller does not provide one
pub const DEFAULT_USER_AGENT: &str = concat!(
    "wikibot-core/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

/// Request timeout applied by the default transport
pub const DEFAULT_TIMEOUT: Duration = Duration::new(960, 0);

/// Parameters forced into every call so replies use the modern JSON shape
pub const FORMAT_PARAMS: [(&str, &str); 2] = [("format", "json"), ("formatversion", "2")];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decoded reply of a single API call
pub type ApiResponse = Map<String, Value>;

/// Options for [`Client::with_options`]
#[derive(Default)]
pub struct ClientOptions {
    /// Falls back to [`DEFAULT_USER_AGENT`] when `None` or empty
    pub user_agent: Option<String>,
    /// Transport to use instead of the default one. A cookie jar is always
    /// installed on it, whatever the builder was configured with.
    pub http: Option<ClientBuilder>,
    /// Jar to keep session cookies in, e.g. to share a login between clients
    pub cookies: Option<Arc<Jar>>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("user_agent", &self.user_agent)
            .field("custom_http", &self.http.is_some())
            .field("shared_cookies", &self.cookies.is_some())
            .finish()
    }
}

/// Mutable state of one session, guarded by a single lock
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) tokens: HashMap<String, String>,
    pub(crate) state: LoginState,
}

/// A session against one wiki's `api.php` endpoint.
///
/// Every call (`get`, `post`, `get_token`, `login`) holds the session lock
/// until it returns, so a client can be shared between threads without
/// interleaving tokens or cookie updates.
#[derive(Debug)]
pub struct Client {
    http: HttpClient,
    api_url: Url,
    user_agent: String,
    cookies: Arc<Jar>,
    session: Mutex<Session>,
}

/// Build the HTTP client used by [`Client`]
///
/// # Arguments
/// * `builder` - transport to configure, or `None` for the default one
/// * `cookies` - jar installed as the cookie store
///
/// # Returns
/// * Returns a reqwest Client that replays cookies from `cookies`
pub fn create_client(builder: Option<ClientBuilder>, cookies: &Arc<Jar>) -> Result<HttpClient> {
    builder
        .unwrap_or_else(|| HttpClient::builder().timeout(DEFAULT_TIMEOUT))
        .cookie_provider(Arc::clone(cookies))
        .build()
        .map_err(WikiError::HttpClient)
}

impl Client {
    /// Create a client for the given endpoint
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::Client;
    /// let client = Client::new("https://en.wikipedia.org/w/api.php", Some("MyBot/1.0 (me@example.org)"))
    ///     .expect("Failed to create client");
    /// ```
    pub fn new(api_url: &str, user_agent: Option<&str>) -> Result<Self> {
        Self::with_options(
            api_url,
            ClientOptions {
                user_agent: user_agent.map(str::to_owned),
                ..Default::default()
            },
        )
    }

    /// Create a client with a custom user agent, transport or cookie jar
    ///
    /// # Arguments
    /// * `api_url` - full URL of the wiki's `api.php`
    /// * `options` - see [`ClientOptions`]
    ///
    /// # Returns
    /// * Returns the client, or a configuration error for a malformed URL,
    ///   an invalid user agent or a transport that fails to build
    ///
    /// # Example
    /// ```no_run
    /// use std::time::Duration;
    /// use wikibot_core::{Client, ClientOptions};
    /// use wikibot_core::networking::ClientBuilder;
    ///
    /// let client = Client::with_options(
    ///     "https://test.wikipedia.org/w/api.php",
    ///     ClientOptions {
    ///         http: Some(ClientBuilder::new().timeout(Duration::from_secs(30))),
    ///         ..Default::default()
    ///     },
    /// )
    /// .expect("Failed to create client");
    /// ```
    pub fn with_options(api_url: &str, options: ClientOptions) -> Result<Self> {
        let parsed = Url::parse(api_url).map_err(|source| WikiError::InvalidUrl {
            url: api_url.to_owned(),
            source,
        })?;

        let user_agent = options
            .user_agent
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        if HeaderValue::from_str(&user_agent).is_err() {
            return Err(WikiError::InvalidUserAgent(user_agent));
        }

        let cookies = options.cookies.unwrap_or_default();
        let http = create_client(options.http, &cookies)?;

        Ok(Self {
            http,
            api_url: parsed,
            user_agent,
            cookies,
            session: Mutex::new(Session::default()),
        })
    }

    /// Replace the transport. The existing cookie jar is installed on the new
    /// one so the session survives the swap.
    pub fn set_http_client(&mut self, builder: ClientBuilder) -> Result<()> {
        self.http = create_client(Some(builder), &self.cookies)?;
        Ok(())
    }

    /// Endpoint every call is sent to
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// User agent sent with every call
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Cookie jar holding the session cookies
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Make a GET request to the API and return the decoded JSON object.
    ///
    /// `format=json` and `formatversion=2` are added to `params`.
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::{Client, Values};
    /// let client = Client::new("https://en.wikipedia.org/w/api.php", None).unwrap();
    /// let reply = client.get(Values::from([("action", "query"), ("meta", "siteinfo")]));
    /// ```
    pub fn get(&self, params: Values) -> Result<ApiResponse> {
        let _session = self.session();
        self.send_get(params)
    }

    /// Make a form encoded POST request to the API and return the decoded JSON object.
    pub fn post(&self, params: Values) -> Result<ApiResponse> {
        let _session = self.session();
        self.send_post(params)
    }

    pub(crate) fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    /// GET without taking the session lock; callers must already hold it
    pub(crate) fn send_get(&self, mut params: Values) -> Result<ApiResponse> {
        apply_format(&mut params);
        let mut url = self.api_url.clone();
        url.set_query(Some(&params.encode()));
        debug!("GET {} ({})", self.api_url, describe(&params));

        self.execute(self.http.get(url).header(USER_AGENT, &self.user_agent))
    }

    /// POST without taking the session lock; callers must already hold it
    pub(crate) fn send_post(&self, mut params: Values) -> Result<ApiResponse> {
        apply_format(&mut params);
        debug!("POST {} ({})", self.api_url, describe(&params));

        let request = self
            .http
            .post(self.api_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(params.encode());
        self.execute(request)
    }

    fn execute(&self, request: RequestBuilder) -> Result<ApiResponse> {
        let response = request.send().map_err(TransportError::Request)?;
        debug!("{} replied {}", self.api_url, response.status());

        // the status is not checked, error replies still carry a JSON body
        let body = response.bytes().map_err(TransportError::Body)?;
        let value: Value = serde_json::from_slice(&body).map_err(TransportError::Json)?;
        match value {
            Value::Object(map) => {
                log_warnings(&map);
                Ok(map)
            }
            other => Err(WikiError::Protocol(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn apply_format(params: &mut Values) {
    for (name, value) in FORMAT_PARAMS {
        params.set(name, value);
    }
}

/// Parameter names for logging; values may hold passwords and tokens
fn describe(params: &Values) -> String {
    let mut names: Vec<&str> = params.names().collect();
    if params.contains(crate::params::TOKEN_PARAM) {
        names.push(crate::params::TOKEN_PARAM);
    }
    names.join(", ")
}

fn log_warnings(response: &ApiResponse) {
    if let Some(Value::Object(warnings)) = response.get("warnings") {
        for (module, warning) in warnings {
            warn!("API warning from {}: {}", module, warning);
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_is_rejected() {
        let err = Client::new("not a url", None).unwrap_err();
        assert!(matches!(err, WikiError::InvalidUrl { .. }));
    }

    #[test]
    fn user_agent_defaults() {
        let client = Client::new("https://wiki.example.org/api.php", None).unwrap();
        assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);

        let client = Client::new("https://wiki.example.org/api.php", Some("")).unwrap();
        assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);

        let client = Client::new("https://wiki.example.org/api.php", Some("TestBot/2.0")).unwrap();
        assert_eq!(client.user_agent(), "TestBot/2.0");
        assert_eq!(client.api_url().path(), "/api.php");
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let err = Client::new("https://wiki.example.org/api.php", Some("bad\nagent")).unwrap_err();
        assert!(matches!(err, WikiError::InvalidUserAgent(_)));
    }

    #[test]
    fn default_user_agent_has_contact_url() {
        assert!(DEFAULT_USER_AGENT.starts_with("wikibot-core/"));
        assert!(DEFAULT_USER_AGENT.contains("(https://"));
    }

    #[test]
    fn format_params_are_forced() {
        let mut params = Values::from([("format", "xml"), ("action", "query")]);
        apply_format(&mut params);
        assert_eq!(params.encode(), "action=query&format=json&formatversion=2");
    }

    #[test]
    fn describe_hides_values() {
        let params = Values::from([("lgpassword", "hunter2"), ("token", "abc")]);
        assert_eq!(describe(&params), "lgpassword, token");
    }
}
