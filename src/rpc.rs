//! Typed client for the AnkiConnect HTTP bridge.
//!
//! AnkiConnect multiplexes every operation through a single POST endpoint:
//! `{action, version, params}` in, `{result, error}` out. This module owns
//! the envelope handling and the error taxonomy; callers get typed results.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::{Card, CardId, Note, NoteId};

/// Protocol version sent with every request. Current AnkiConnect releases
/// speak v6.
const PROTOCOL_VERSION: u32 = 6;

/// Errors surfaced by bridge calls.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport failure: AnkiConnect (or Anki itself) is not reachable.
    #[error("cannot reach AnkiConnect at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The bridge understood the call but the store rejected it, e.g. a
    /// malformed search query. The message is Anki's own wording.
    #[error("AnkiConnect error: {0}")]
    Application(String),
    /// The response was not the expected `{result, error}` envelope.
    #[error("unexpected AnkiConnect response: {0}")]
    Protocol(String),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

/// Operations the search pipeline needs from the note store. `AnkiClient`
/// is the real implementation; orchestrator tests substitute a fake.
#[async_trait]
pub trait NoteBridge {
    async fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, RpcError>;
    async fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<Note>, RpcError>;
    async fn find_cards(&self, query: &str) -> Result<Vec<CardId>, RpcError>;
    async fn cards_info(&self, ids: &[CardId]) -> Result<Vec<Card>, RpcError>;
    async fn tags(&self) -> Result<Vec<String>, RpcError>;
    async fn open_browser(&self, query: &str) -> Result<(), RpcError>;
}

pub struct AnkiClient {
    url: String,
    client: reqwest::Client,
}

impl AnkiClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Send one `{action, version, params}` request and decode the result.
    /// One attempt, no retries: a dead bridge fails fast so the launcher
    /// can render an explanation instead of hanging.
    async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let request = RpcRequest {
            action,
            version: PROTOCOL_VERSION,
            params,
        };
        tracing::debug!(action, "calling AnkiConnect");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|source| RpcError::Connection {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Protocol(format!("HTTP {status} from bridge")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RpcError::Protocol(format!("undecodable body: {e}")))?;

        let result = unwrap_envelope(body)?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::Protocol(format!("bad {action} result shape: {e}")))
    }
}

/// Validate the `{result, error}` envelope and pull out the result.
/// AnkiConnect always sends exactly these two members; anything else means
/// the caller is not talking to AnkiConnect and the data cannot be trusted.
fn unwrap_envelope(body: Value) -> Result<Value, RpcError> {
    let mut object = match body {
        Value::Object(map) => map,
        other => {
            return Err(RpcError::Protocol(format!(
                "expected an object, got {other}"
            )))
        }
    };

    let result = object
        .remove("result")
        .ok_or_else(|| RpcError::Protocol("response is missing the result member".into()))?;
    let error = object
        .remove("error")
        .ok_or_else(|| RpcError::Protocol("response is missing the error member".into()))?;
    if !object.is_empty() {
        return Err(RpcError::Protocol(
            "response carries unexpected extra members".into(),
        ));
    }

    match error {
        Value::Null => Ok(result),
        Value::String(message) => Err(RpcError::Application(message)),
        other => Err(RpcError::Protocol(format!(
            "non-string error member: {other}"
        ))),
    }
}

#[async_trait]
impl NoteBridge for AnkiClient {
    async fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, RpcError> {
        self.invoke("findNotes", json!({ "query": query })).await
    }

    async fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<Note>, RpcError> {
        self.invoke("notesInfo", json!({ "notes": ids })).await
    }

    async fn find_cards(&self, query: &str) -> Result<Vec<CardId>, RpcError> {
        self.invoke("findCards", json!({ "query": query })).await
    }

    async fn cards_info(&self, ids: &[CardId]) -> Result<Vec<Card>, RpcError> {
        self.invoke("cardsInfo", json!({ "cards": ids })).await
    }

    async fn tags(&self) -> Result<Vec<String>, RpcError> {
        self.invoke("getTags", json!({})).await
    }

    async fn open_browser(&self, query: &str) -> Result<(), RpcError> {
        // guiBrowse answers with the matched card ids; nothing here needs
        // them.
        let _ids: Vec<CardId> = self.invoke("guiBrowse", json!({ "query": query })).await?;
        Ok(())
    }
}
