use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{QueryBackend, QueryGenerator, RequestLogger, TracingRequestLogger};
use crate::data::query_result::QueryResult;

/// Blocking JSON-over-HTTP client shared by the collaborators
#[derive(Clone)]
pub struct JsonHttpClient {
    client: Client,
    logger: Arc<dyn RequestLogger>,
}

impl JsonHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_logger(timeout, Arc::new(TracingRequestLogger))
    }

    pub fn with_logger(timeout: Duration, logger: Arc<dyn RequestLogger>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, logger })
    }

    /// POST `body` and return the decoded JSON response with the elapsed
    /// time. Non-success statuses are errors carrying the response text.
    pub fn post_json(&self, url: &str, body: &Value) -> Result<(Value, Duration)> {
        self.logger.on_request("POST", url, body);
        let started = Instant::now();

        let response = match self.client.post(url).json(body).send() {
            Ok(response) => response,
            Err(e) => {
                self.logger.on_error(url, &e.to_string());
                return Err(anyhow!(e).context(format!("Request to {} failed", url)));
            }
        };

        let status = response.status();
        let elapsed = started.elapsed();
        self.logger.on_response(url, status.as_u16(), elapsed);

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            self.logger.on_error(url, &error_text);
            bail!("API Error ({}): {}", status, error_text);
        }

        let value: Value = response
            .json()
            .with_context(|| format!("Response from {} is not JSON", url))?;
        Ok((value, elapsed))
    }
}

/// Decode an execution response, surfacing a backend `error` field
pub fn parse_query_response(value: &Value) -> Result<QueryResult> {
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .or_else(|| error.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| error.to_string());
        bail!("Backend error: {}", message);
    }
    QueryResult::from_json(value)
}

/// Extract generated query text from `{"sql": ...}`, `{"query": ...}` or a
/// bare string, dropping a surrounding markdown code fence
pub fn parse_generator_response(value: &Value) -> Result<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => ["sql", "query", "text"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .ok_or_else(|| anyhow!("Generator response has no 'sql' field"))?,
        _ => bail!("Unexpected generator response: {}", value),
    };

    let trimmed = text.trim();
    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
            body.trim_end().trim_end_matches("```")
        }
        None => trimmed,
    };

    let sql = unfenced.trim();
    if sql.is_empty() {
        bail!("Generator returned an empty query");
    }
    Ok(sql.to_string())
}

/// Executes queries by POSTing `{"query": text}` to a URL
#[derive(Clone)]
pub struct HttpQueryBackend {
    url: String,
    http: JsonHttpClient,
}

impl HttpQueryBackend {
    pub fn new(url: impl Into<String>, http: JsonHttpClient) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl QueryBackend for HttpQueryBackend {
    fn execute(&self, query: &str) -> Result<QueryResult> {
        let (value, elapsed) = self.http.post_json(&self.url, &json!({ "query": query }))?;
        let mut result = parse_query_response(&value)?;
        if result.execution_time <= 0.0 {
            result.execution_time = elapsed.as_secs_f64() * 1000.0;
        }
        if value.get("executedAt").is_none() {
            result.executed_at = Utc::now();
        }
        Ok(result)
    }
}

/// Generates queries by POSTing `{"prompt": text}` to a URL
#[derive(Clone)]
pub struct HttpQueryGenerator {
    url: String,
    http: JsonHttpClient,
}

impl HttpQueryGenerator {
    pub fn new(url: impl Into<String>, http: JsonHttpClient) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

impl QueryGenerator for HttpQueryGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let (value, _) = self.http.post_json(&self.url, &json!({ "prompt": prompt }))?;
        parse_generator_response(&value)
    }
}
