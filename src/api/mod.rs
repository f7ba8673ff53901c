//! External collaborators
//!
//! Query execution and natural-language query generation live behind
//! these traits. The HTTP implementations log through an injected
//! [`RequestLogger`].

pub mod api_client;

use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::data::query_result::QueryResult;

pub use api_client::{
    parse_generator_response, parse_query_response, HttpQueryBackend, HttpQueryGenerator,
    JsonHttpClient,
};

/// Executes query text and returns a canonical result
pub trait QueryBackend {
    fn execute(&self, query: &str) -> Result<QueryResult>;
}

/// Turns a natural-language prompt into query text
pub trait QueryGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Observes HTTP traffic of the collaborators
pub trait RequestLogger: Send + Sync {
    fn on_request(&self, method: &str, url: &str, body: &Value);
    fn on_response(&self, url: &str, status: u16, elapsed: Duration);
    fn on_error(&self, url: &str, error: &str);
}

/// Writes request traffic to the `api` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn on_request(&self, method: &str, url: &str, body: &Value) {
        debug!(target: "api", "{} {} {}", method, url, body);
    }

    fn on_response(&self, url: &str, status: u16, elapsed: Duration) {
        debug!(target: "api", "{} -> {} in {:?}", url, status, elapsed);
    }

    fn on_error(&self, url: &str, error: &str) {
        warn!(target: "api", "{} failed: {}", url, error);
    }
}
