//! Telemetry event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event property map
pub type Properties = Map<String, Value>;

/// Kind of analytics call an event maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Install identity and traits (sent once at registration)
    Identify,
    /// Named event with properties (heartbeat memory statistics)
    Track,
    /// Page view (one per sampled request)
    Page,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Track => "track",
            Self::Page => "page",
        }
    }
}

/// A discrete event handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub name: String,
    /// Anonymous install identity, never a user identifier
    pub user_id: String,
    pub properties: Properties,
    /// Excluded from engagement analytics when set
    pub non_interaction: bool,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    fn new(kind: EventKind, name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            user_id: user_id.into(),
            properties: Properties::new(),
            non_interaction: false,
            timestamp: Utc::now(),
        }
    }

    pub fn identify(user_id: impl Into<String>) -> Self {
        Self::new(EventKind::Identify, "identify", user_id)
    }

    pub fn track(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Track, name, user_id)
    }

    pub fn page(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Page, name, user_id)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn non_interaction(mut self) -> Self {
        self.non_interaction = true;
        self
    }

    /// Serialize as one JSON line
    pub fn to_json(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        serde_json::to_string(self).context("Failed to serialize event to JSON")
    }
}
