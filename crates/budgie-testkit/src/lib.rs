// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Helpers for tests that talk to a text-generation endpoint: a scripted
//! `tiny_http` server that records what it received, plus canned bodies in
//! the shape the Gemini REST API uses.

use anyhow::{Context, Result, anyhow, bail};
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// An address nothing listens on; requests to it fail fast.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1/v1beta";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A successful generation whose only text part is `text`.
    pub fn text(text: &str) -> Self {
        Self::ok(gemini_text_body(text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).context("decode recorded request body")
    }

    /// Text of the first part of the first content entry.
    pub fn prompt(&self) -> Result<String> {
        let value = self.json()?;
        value["contents"][0]["parts"][0]["text"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("request body has no prompt text: {}", self.body))
    }
}

/// Serves the scripted responses in order, one per request, then stops.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}/v1beta", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::with_capacity(responses.len());
            for scripted in responses {
                let Some(mut request) = server
                    .recv_timeout(RECV_TIMEOUT)
                    .context("receive mock request")?
                else {
                    bail!(
                        "mock server timed out after {} request(s)",
                        recorded.len()
                    );
                };

                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("read mock request body")?;
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| (header.field.to_string(), header.value.to_string()))
                        .collect(),
                    body,
                });

                let content_type = Header::from_bytes("Content-Type", "application/json")
                    .map_err(|()| anyhow!("invalid content type header"))?;
                let response = Response::from_string(scripted.body)
                    .with_status_code(scripted.status)
                    .with_header(content_type);
                request.respond(response).context("send mock response")?;
            }
            Ok(recorded)
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for every scripted response to be served and returns what the
    /// server saw.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}

pub fn gemini_text_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }],
            },
            "finishReason": "STOP",
        }],
    })
    .to_string()
}

pub fn gemini_error_body(code: u16, message: &str) -> String {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "status": "INVALID_ARGUMENT",
        },
    })
    .to_string()
}
