//! Typed replies and credentials used by the login protocol

pub mod blocking;

use crate::errors::{ApiError, Result, WikiError};
use crate::networking::client::blocking::ApiResponse;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

/// Login result MediaWiki reports for a successful login
pub const LOGIN_SUCCESS: &str = "Success";

/// Where a client stands in the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    Unauthenticated,
    /// A login token was fetched and the credentials are about to be sent
    TokenObtained,
    Authenticated,
    /// The last login attempt failed; calling `login` again starts over
    Failed,
}

/// Reply to `action=query&meta=tokens`
#[derive(Deserialize, Debug)]
pub(crate) struct TokenQueryResponse {
    pub query: Option<TokenQuery>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TokenQuery {
    pub tokens: Option<HashMap<String, Value>>,
}

/// Reply to `action=login`
#[derive(Deserialize, Debug)]
pub(crate) struct LoginResponse {
    pub login: Option<LoginResult>,
}

/// The reason is left out by MediaWiki when the login succeeds
#[derive(Deserialize, Debug)]
pub(crate) struct LoginResult {
    pub result: Option<String>,
    #[serde(default)]
    pub reason: Option<Value>,
}

impl LoginResult {
    pub fn reason(&self) -> Option<String> {
        self.reason.as_ref().and_then(Value::as_str).map(str::to_owned)
    }
}

/// Top level `error` object MediaWiki sends when it rejects a request
#[derive(Deserialize, Debug)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub info: Option<String>,
}

/// Decode `response` into the typed reply `T`.
///
/// An `error` object becomes an [`ApiError`]; anything that does not fit `T`
/// is a protocol error.
pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse, call: &str) -> Result<T> {
    let value = Value::Object(response);
    if let Ok(ErrorEnvelope { error: Some(body) }) = ErrorEnvelope::deserialize(&value) {
        return Err(ApiError::new(body.code, body.info).into());
    }
    serde_json::from_value(value)
        .map_err(|err| WikiError::Protocol(format!("invalid {call} response: {err}")))
}

/// Credentials for one wiki, as stored in the credentials file
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct Family {
    #[serde(rename = "apiUrl")]
    pub api_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Wiki families keyed by name
///
/// The file is a JSON object:
/// ```json
/// { "enwiki": { "apiUrl": "https://en.wikipedia.org/w/api.php", "username": "Bot", "password": "..." } }
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CredentialStore {
    families: BTreeMap<String, Family>,
}

impl CredentialStore {
    /// Read the credentials file at `path`
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::CredentialStore;
    /// let store = CredentialStore::load("config.json").expect("failed to read credentials");
    /// let wiki = store.family("enwiki").unwrap();
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(WikiError::Credentials)
    }

    /// Credentials for the family called `name`
    ///
    /// # Returns
    /// * Returns the family, or `WikiError::UnknownFamily` if the store has no such entry
    pub fn family(&self, name: &str) -> Result<&Family> {
        self.families
            .get(name)
            .ok_or_else(|| WikiError::UnknownFamily(name.to_owned()))
    }

    /// Family names in alphabetical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> ApiResponse {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn login_reason_is_optional() {
        let reply: LoginResponse =
            decode(object(json!({"login": {"result": "Success"}})), "login").unwrap();
        let login = reply.login.unwrap();
        assert_eq!(login.result.as_deref(), Some("Success"));
        assert_eq!(login.reason(), None);
    }

    #[test]
    fn wrong_typed_result_is_protocol_error() {
        let err = decode::<LoginResponse>(object(json!({"login": {"result": 5}})), "login")
            .unwrap_err();
        assert!(err.is_protocol());

        let err = decode::<TokenQueryResponse>(object(json!({"query": "tokens"})), "tokens")
            .unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn error_object_is_api_error() {
        let reply = object(json!({
            "error": {"code": "badvalue", "info": "Unrecognized value for parameter \"type\"."}
        }));
        let err = decode::<TokenQueryResponse>(reply, "tokens").unwrap_err();
        let api = err.as_api_error().unwrap();
        assert_eq!(api.code, "badvalue");
        assert_eq!(
            api.info.as_deref(),
            Some("Unrecognized value for parameter \"type\".")
        );
    }

    #[test]
    fn credentials_parse() {
        let store = CredentialStore::from_json(
            r#"{
                "testwiki": {"apiUrl": "https://test.example.org/api.php", "username": "Bot", "password": "pw"},
                "enwiki": {"apiUrl": "https://en.example.org/w/api.php", "username": "Bot2", "password": "pw2"}
            }"#,
        )
        .unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["enwiki", "testwiki"]);
        let family = store.family("testwiki").unwrap();
        assert_eq!(family.api_url, "https://test.example.org/api.php");
        assert_eq!(family.username, "Bot");

        let err = store.family("dewiki").unwrap_err();
        assert!(matches!(err, WikiError::UnknownFamily(name) if name == "dewiki"));
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        let err = CredentialStore::from_json(r#"{"testwiki": {"username": "Bot"}}"#).unwrap_err();
        assert!(matches!(err, WikiError::Credentials(_)));
    }

    #[test]
    fn family_debug_hides_password() {
        let family = Family {
            api_url: "https://test.example.org/api.php".into(),
            username: "Bot".into(),
            password: "hunter2".into(),
        };
        let shown = format!("{family:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("Bot"));
    }
}
