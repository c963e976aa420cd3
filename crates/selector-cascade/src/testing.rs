//! Scripted collaborators for exercising cascades without a transport.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use selector_core::{
    ConditionCallback, EntityCondition, EntityFetcher, FetchEnvelope, Query, Result,
    SelectOption, SelectorError,
};

type ScriptKey = (Query, Option<String>);

enum Reply {
    Envelope(FetchEnvelope),
    Transport(String),
}

struct Scripted {
    reply: Reply,
    gate: Option<Arc<Notify>>,
}

/// Fetcher answering from queued replies.
///
/// Replies can be keyed by the `serviceId` parameter so concurrent cascades for
/// different services get their own answers. Unscripted queries succeed empty.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<ScriptKey, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(Query, Value)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: ScriptKey, reply: Reply, gate: Option<Arc<Notify>>) {
        self.scripts
            .lock()
            .entry(key)
            .or_default()
            .push_back(Scripted { reply, gate });
    }

    pub fn respond(&self, query: Query, options: Vec<SelectOption>) {
        self.push((query, None), Reply::Envelope(FetchEnvelope::ok(query, options)), None);
    }

    pub fn respond_for(&self, query: Query, service_id: &str, options: Vec<SelectOption>) {
        self.push(
            (query, Some(service_id.to_string())),
            Reply::Envelope(FetchEnvelope::ok(query, options)),
            None,
        );
    }

    /// Reply with an envelope carrying `errors`.
    pub fn respond_error(&self, query: Query, message: &str) {
        self.push((query, None), Reply::Envelope(FetchEnvelope::failed(message)), None);
    }

    /// Fail below the envelope, as a broken connection would.
    pub fn fail_transport(&self, query: Query, message: &str) {
        self.push((query, None), Reply::Transport(message.to_string()), None);
    }

    /// Queue an unkeyed reply that is held until the returned gate is notified.
    pub fn respond_gated(&self, query: Query, options: Vec<SelectOption>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            (query, None),
            Reply::Envelope(FetchEnvelope::ok(query, options)),
            Some(gate.clone()),
        );
        gate
    }

    /// Queue a reply keyed by `serviceId` that is held until the returned gate is notified.
    pub fn respond_gated_for(
        &self,
        query: Query,
        service_id: &str,
        options: Vec<SelectOption>,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            (query, Some(service_id.to_string())),
            Reply::Envelope(FetchEnvelope::ok(query, options)),
            Some(gate.clone()),
        );
        gate
    }

    pub fn calls(&self) -> Vec<(Query, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, query: Query) -> usize {
        self.calls.lock().iter().filter(|(q, _)| *q == query).count()
    }

    fn next_reply(&self, query: Query, service_id: Option<String>) -> Option<Scripted> {
        let mut scripts = self.scripts.lock();
        if let Some(id) = service_id {
            if let Some(scripted) = scripts.get_mut(&(query, Some(id))).and_then(VecDeque::pop_front) {
                return Some(scripted);
            }
        }
        scripts.get_mut(&(query, None)).and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl EntityFetcher for ScriptedFetcher {
    async fn fetch(&self, query: Query, params: Value) -> Result<FetchEnvelope> {
        let service_id = params
            .get("serviceId")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.calls.lock().push((query, params));

        let Some(scripted) = self.next_reply(query, service_id) else {
            return Ok(FetchEnvelope::ok(query, Vec::new()));
        };
        if let Some(gate) = scripted.gate {
            gate.notified().await;
        }
        match scripted.reply {
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Transport(message) => Err(SelectorError::Fetch(message)),
        }
    }
}

/// Callback that records every condition it is handed.
#[derive(Default)]
pub struct RecordingCallback {
    conditions: Mutex<Vec<EntityCondition>>,
    fail_with: Option<String>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            conditions: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn conditions(&self) -> Vec<EntityCondition> {
        self.conditions.lock().clone()
    }
}

#[async_trait]
impl ConditionCallback for RecordingCallback {
    async fn on_condition(&self, condition: EntityCondition) -> Result<()> {
        self.conditions.lock().push(condition);
        match &self.fail_with {
            Some(message) => Err(SelectorError::Callback(message.clone())),
            None => Ok(()),
        }
    }
}
