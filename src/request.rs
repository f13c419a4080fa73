//! Purpose: Perform the single outbound GET and decode the JSON reply.
//! Exports: `Client`, `build_request_url`.
//! Role: Transport boundary wrapping a blocking `ureq` agent.
//! Invariants: Exactly one request is issued per `get_json` call.
//! Invariants: Non-2xx replies are still decoded; only transport failures
//! Invariants: map to `ErrorKind::Network`.
#![allow(clippy::result_large_err)]

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, ErrorKind};

pub struct Client {
    agent: ureq::Agent,
}

impl Client {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    /// A client whose requests fail with a Network error once `timeout`
    /// elapses. The default client carries no timeout at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Issues one GET to `url` with `pairs` appended as query parameters
    /// and decodes the response body as JSON.
    ///
    /// The response status is not inspected: an error status whose body is
    /// valid JSON still produces `Ok`, decorated with nothing. Only a body
    /// that fails to decode surfaces the status, as context on the
    /// `Decode` error.
    pub fn get_json(&self, url: &str, pairs: &[(String, String)]) -> Result<Value, Error> {
        let url = build_request_url(url, pairs)?;
        debug!(url = %url, "issuing GET");
        let response = self
            .agent
            .request("GET", url.as_str())
            .set("Accept", "application/json")
            .call();
        match response {
            Ok(resp) => read_json_body(resp),
            Err(ureq::Error::Status(code, resp)) => {
                debug!(status = code, "non-success status, decoding body anyway");
                read_json_body(resp).map_err(|err| err.with_status(code))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Network)
                .with_message("request failed")
                .with_url(url.as_str())
                .with_source(err)),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the target URL and appends the query pairs. An existing query
/// string on the URL is kept; encoded pairs land after it.
pub fn build_request_url(raw: &str, pairs: &[(String, String)]) -> Result<Url, Error> {
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid request url")
            .with_url(raw)
            .with_source(err)
            .with_hint("Pass an absolute http or https URL via --url.")
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("request url must use http or https scheme")
            .with_url(raw));
    }
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

fn read_json_body<R>(response: ureq::Response) -> Result<R, Error>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    debug!(bytes = body.len(), "response body read");
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("response body is not valid json")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{build_request_url, read_json_body};
    use crate::error::ErrorKind;
    use serde_json::{Value, json};

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn build_request_url_appends_pairs() {
        let url = build_request_url(
            "https://api.example.com/search",
            &[pair("q", "test"), pair("limit", "5")],
        )
        .expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/search?q=test&limit=5");
    }

    #[test]
    fn build_request_url_keeps_existing_query() {
        let url = build_request_url("https://api.example.com/search?key=abc", &[pair("q", "x")])
            .expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/search?key=abc&q=x");
    }

    #[test]
    fn build_request_url_percent_encodes_values() {
        let url = build_request_url(
            "http://localhost:8080/find",
            &[pair("input", "Joe's Diner & Grill")],
        )
        .expect("url");
        assert_eq!(
            url.query(),
            Some("input=Joe%27s+Diner+%26+Grill")
        );
    }

    #[test]
    fn build_request_url_rejects_relative_url() {
        let err = build_request_url("/just/a/path", &[]).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn build_request_url_rejects_non_http_scheme() {
        let err = build_request_url("ftp://example.com/x", &[]).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn read_json_body_decodes_valid_json() {
        let resp = ureq::Response::new(200, "OK", r#"{"results": []}"#).expect("response");
        let value: Value = read_json_body(resp).expect("value");
        assert_eq!(value, json!({"results": []}));
    }

    #[test]
    fn read_json_body_rejects_plain_text() {
        let resp = ureq::Response::new(200, "OK", "OK").expect("response");
        let err = read_json_body::<Value>(resp).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
