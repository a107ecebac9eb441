//! Blocking token and login handling for MediaWiki
use crate::errors::{ApiError, Result, WikiError};
use crate::networking::auth::{
    Family, LOGIN_SUCCESS, LoginResponse, LoginState, TokenQueryResponse, decode,
};
use crate::networking::client::blocking::{Client, Session};
use crate::params::Values;
use crate::utils::token_field;
use log::{debug, info, warn};
use reqwest::Url;
use serde_json::Value;

/// Token purpose used for logging in. Tokens for it are never cached.
pub const LOGIN_TOKEN: &str = "login";

impl Client {
    /// Create a client for the wiki described by `family`
    pub fn from_family(family: &Family, user_agent: Option<&str>) -> Result<Self> {
        Client::new(&family.api_url, user_agent)
    }

    /// Get a token for `purpose` (`csrf`, `watch`, `login`, ...)
    ///
    /// Tokens are cached per purpose after the first fetch, except login
    /// tokens which are fetched fresh on every call.
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::Client;
    /// let client = Client::new("https://test.wikipedia.org/w/api.php", None).unwrap();
    /// let token = client.get_token("csrf").expect("failed to get csrf token");
    /// ```
    pub fn get_token(&self, purpose: &str) -> Result<String> {
        let mut session = self.session();
        self.token_locked(&mut session, purpose)
    }

    /// The cached token for `purpose`, without touching the network
    pub fn cached_token(&self, purpose: &str) -> Option<String> {
        self.session().tokens.get(purpose).cloned()
    }

    /// Where the last login attempt left this client
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::{Client, LoginState};
    /// let client = Client::new("https://test.wikipedia.org/w/api.php", None).unwrap();
    /// assert_eq!(client.state(), LoginState::Unauthenticated);
    /// ```
    pub fn state(&self) -> LoginState {
        self.session().state
    }

    /// Whether the last login succeeded
    pub fn is_authenticated(&self) -> bool {
        self.state() == LoginState::Authenticated
    }

    /// Log in with a bot password or account credentials.
    ///
    /// Fetches a fresh login token and posts the credentials once. On success
    /// the session cookie set by the wiki is kept in the cookie jar and used
    /// by every following call. Nothing is retried: a failed login, including
    /// one rejected for a stale token, is returned to the caller, who may call
    /// `login` again to start over with a new token.
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::Client;
    /// let client = Client::new("https://test.wikipedia.org/w/api.php", None).unwrap();
    /// client.login("ExampleBot@task", "bot password").expect("login failed");
    /// assert!(client.is_authenticated());
    /// ```
    pub fn login(&self, username: &str, password: &str) -> Result<()> {
        let mut session = self.session();
        session.state = LoginState::Unauthenticated;

        let outcome = self.login_locked(&mut session, username, password);
        session.state = if outcome.is_ok() {
            LoginState::Authenticated
        } else {
            LoginState::Failed
        };
        outcome
    }

    /// Log in with the credentials of a wiki family
    ///
    /// # Arguments
    /// * `family` - credentials, usually from a [`crate::CredentialStore`]
    ///
    /// # Returns
    /// * Returns the same results as [`Client::login`], or a configuration
    ///   error if the family's `apiUrl` is malformed
    ///
    /// # Example
    /// ```no_run
    /// use wikibot_core::{Client, CredentialStore};
    /// let store = CredentialStore::load("config.json").unwrap();
    /// let wiki = store.family("testwiki").unwrap();
    /// let client = Client::from_family(wiki, None).unwrap();
    /// client.login_family(wiki).expect("login failed");
    /// ```
    pub fn login_family(&self, family: &Family) -> Result<()> {
        if !same_endpoint(self.api_url(), &family.api_url)? {
            warn!(
                "Sending credentials of {} for {} to {}",
                family.username,
                family.api_url,
                self.api_url()
            );
        }
        self.login(&family.username, &family.password)
    }

    fn login_locked(&self, session: &mut Session, username: &str, password: &str) -> Result<()> {
        let token = self.token_locked(session, LOGIN_TOKEN)?;
        session.state = LoginState::TokenObtained;

        info!("Attempting to log in as {}", username);
        let params = Values::from([
            ("action", "login"),
            ("lgname", username),
            ("lgpassword", password),
            ("lgtoken", token.as_str()),
        ]);
        let reply: LoginResponse = decode(self.send_post(params)?, "login")?;

        let login = reply.login.ok_or_else(|| {
            WikiError::Protocol("invalid API response: missing 'login' field".to_owned())
        })?;
        let result = login.result.as_deref().ok_or_else(|| {
            WikiError::Protocol("invalid API response: missing 'result' field".to_owned())
        })?;

        if result != LOGIN_SUCCESS {
            let err = ApiError::new(result, login.reason());
            warn!("Login as {} failed: {}", username, err);
            return Err(err.into());
        }

        info!("Successfully logged in as {}", username);
        Ok(())
    }

    fn token_locked(&self, session: &mut Session, purpose: &str) -> Result<String> {
        let cacheable = purpose != LOGIN_TOKEN;
        if cacheable {
            if let Some(token) = session.tokens.get(purpose) {
                debug!("Using cached {} token", purpose);
                return Ok(token.clone());
            }
        }

        debug!("Fetching {} token", purpose);
        let params = Values::from([("action", "query"), ("meta", "tokens"), ("type", purpose)]);
        let reply: TokenQueryResponse = decode(self.send_get(params)?, "tokens")?;

        let tokens = reply
            .query
            .ok_or_else(|| WikiError::Protocol("missing 'query' field".to_owned()))?
            .tokens
            .ok_or_else(|| WikiError::Protocol("missing 'tokens' field".to_owned()))?;
        let field = token_field(purpose);
        let token = match tokens.get(&field) {
            Some(Value::String(token)) => token.clone(),
            _ => {
                return Err(WikiError::Protocol(format!(
                    "missing or invalid token field '{field}'"
                )));
            }
        };

        if cacheable {
            session.tokens.insert(purpose.to_owned(), token.clone());
        }
        Ok(token)
    }
}

/// Whether `other` parses to the same endpoint as `url`
pub(crate) fn same_endpoint(url: &Url, other: &str) -> Result<bool> {
    let parsed = Url::parse(other).map_err(|source| WikiError::InvalidUrl {
        url: other.to_owned(),
        source,
    })?;
    Ok(&parsed == url)
}
