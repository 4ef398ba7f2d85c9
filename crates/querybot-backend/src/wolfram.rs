//! Wolfram|Alpha Full Results API client (v2, JSON output).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use querybot_core::types::ImageRef;

use crate::provider::{BackendError, ComputeBackend, QueryOutcome, ResultGroup, SubResult};

pub struct WolframAlphaClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    /// Added to the scan timeout to form the client-side request deadline.
    grace: Duration,
}

impl WolframAlphaClient {
    pub fn new(base_url: Option<String>, app_id: String, grace: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or_else(|| "https://api.wolframalpha.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            app_id,
            grace,
        }
    }
}

#[async_trait]
impl ComputeBackend for WolframAlphaClient {
    fn name(&self) -> &str {
        "wolframalpha"
    }

    async fn query(
        &self,
        input: &str,
        scan_timeout: Duration,
    ) -> Result<QueryOutcome, BackendError> {
        let url = format!("{}/v2/query", self.base_url);
        let deadline = scan_timeout + self.grace;
        let scan = format!("{:.1}", scan_timeout.as_secs_f64());

        debug!(input, scan_timeout = %scan, "sending query to Wolfram|Alpha");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("input", input),
                ("output", "json"),
                ("format", "plaintext,image"),
                ("scantimeout", scan.as_str()),
            ])
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| classify(e, deadline))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Wolfram|Alpha API error");
            return Err(BackendError::Api {
                status,
                message: text,
            });
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| match classify(e, deadline) {
                BackendError::Http(e) => BackendError::Parse(e.to_string()),
                other => other,
            })?;

        parse_response(body.queryresult)
    }
}

/// Surface request deadline expiry as `Timeout`, everything else as `Http`.
fn classify(e: reqwest::Error, deadline: Duration) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout {
            ms: deadline.as_millis() as u64,
        }
    } else {
        BackendError::Http(e)
    }
}

fn parse_response(result: QueryResult) -> Result<QueryOutcome, BackendError> {
    if let Some(message) = result.error.message() {
        return Err(BackendError::Api {
            status: 200,
            message,
        });
    }

    let pods = match result.pods {
        Some(pods) if result.success && !pods.is_empty() => pods,
        _ => return Ok(QueryOutcome::NoResult),
    };

    let groups = pods
        .into_iter()
        .map(|pod| ResultGroup {
            id: pod.id,
            title: pod.title,
            subresults: pod
                .subpods
                .into_iter()
                .map(|sub| SubResult {
                    plaintext: sub.plaintext.filter(|t| !t.trim().is_empty()),
                    images: sub
                        .img
                        .map(OneOrMany::into_vec)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|img| ImageRef {
                            url: img.src,
                            alt: img.alt,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(QueryOutcome::Groups(groups))
}

// --- wire types ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse {
    queryresult: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    success: bool,
    /// `false` on success, an object with `code`/`msg` on failure.
    #[serde(default)]
    error: ApiErrorField,
    pods: Option<Vec<Pod>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ApiErrorField {
    #[default]
    Missing,
    Flag(bool),
    Detail {
        #[serde(default)]
        code: serde_json::Value,
        #[serde(default)]
        msg: String,
    },
}

impl ApiErrorField {
    fn message(&self) -> Option<String> {
        match self {
            ApiErrorField::Missing | ApiErrorField::Flag(false) => None,
            ApiErrorField::Flag(true) => Some("unspecified error".to_string()),
            ApiErrorField::Detail { code, msg } => Some(format!("{msg} (code {code})")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    title: String,
    id: Option<String>,
    #[serde(default)]
    subpods: Vec<Subpod>,
}

#[derive(Debug, Deserialize)]
struct Subpod {
    plaintext: Option<String>,
    img: Option<OneOrMany<Img>>,
}

#[derive(Debug, Deserialize)]
struct Img {
    src: String,
    alt: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(t) => vec![t],
            OneOrMany::Many(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_body() -> serde_json::Value {
        serde_json::json!({
            "queryresult": {
                "success": true,
                "error": false,
                "numpods": 2,
                "pods": [
                    {
                        "title": "Input interpretation",
                        "id": "Input",
                        "subpods": [{
                            "title": "",
                            "plaintext": "convert 1 GHz to hertz",
                            "img": {"src": "https://img.example/in.gif", "alt": "convert 1 GHz to hertz"}
                        }]
                    },
                    {
                        "title": "Result",
                        "id": "Result",
                        "subpods": [{
                            "title": "",
                            "plaintext": "1×10^9 Hz (hertz)",
                            "img": {"src": "https://img.example/res.gif", "alt": "1×10^9 Hz"}
                        }]
                    }
                ]
            }
        })
    }

    fn client(server: &MockServer) -> WolframAlphaClient {
        WolframAlphaClient::new(Some(server.uri()), "APPID".into(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn parses_pods_into_groups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/query"))
            .and(query_param("appid", "APPID"))
            .and(query_param("input", "1GHz to Hz"))
            .and(query_param("output", "json"))
            .and(query_param("scantimeout", "10.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .query("1GHz to Hz", Duration::from_secs(10))
            .await
            .unwrap();
        let QueryOutcome::Groups(groups) = outcome else {
            panic!("expected groups");
        };
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_input_echo());
        assert_eq!(groups[1].title, "Result");
        assert_eq!(
            groups[1].subresults[0].plaintext.as_deref(),
            Some("1×10^9 Hz (hertz)")
        );
        assert_eq!(groups[1].subresults[0].images[0].url, "https://img.example/res.gif");
    }

    #[tokio::test]
    async fn unsuccessful_query_is_no_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryresult": {"success": false, "error": false, "numpods": 0}
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .query("🙂🙂", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::NoResult);
    }

    #[tokio::test]
    async fn api_error_object_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryresult": {"success": false, "error": {"code": "1", "msg": "Invalid appid"}}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .query("2+2", Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 200, ref message } if message.contains("Invalid appid")));
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let err = client(&server)
            .query("2+2", Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_body())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client =
            WolframAlphaClient::new(Some(server.uri()), "APPID".into(), Duration::from_millis(100));
        let err = client.query("2+2", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout { ms: 100 }));
    }
}
