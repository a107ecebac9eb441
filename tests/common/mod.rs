#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use wikibot_core::Client;

pub const USER_AGENT: &str = "TestBot/1.0 (testbot@example.org)";

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

pub fn api_url(server: &ServerGuard) -> String {
    format!("{}/api.php", server.url())
}

pub fn client(server: &ServerGuard) -> Client {
    init_logger();
    Client::new(&api_url(server), Some(USER_AGENT)).expect("client should build")
}

/// Mock a `meta=tokens` query answering with `token` for `purpose`
pub fn token_mock(server: &mut ServerGuard, purpose: &str, token: &str) -> Mock {
    let field = format!("{purpose}token");
    let body = json!({
        "batchcomplete": true,
        "query": { "tokens": { field: token } }
    });
    token_reply(server, purpose, &body.to_string())
}

pub fn token_reply(server: &mut ServerGuard, purpose: &str, body: &str) -> Mock {
    server
        .mock("GET", "/api.php")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "query".into()),
            Matcher::UrlEncoded("meta".into(), "tokens".into()),
            Matcher::UrlEncoded("type".into(), purpose.into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("formatversion".into(), "2".into()),
        ]))
        .match_header("user-agent", USER_AGENT)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(body)
}
