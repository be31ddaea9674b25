use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A curated link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Hidden from public listing and resolution when false
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    /// Absolute icon URL, empty until known
    #[serde(default)]
    pub favicon: String,
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
}

/// The `urls` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkCatalogDocument {
    #[serde(default)]
    pub urls: Vec<LinkRecord>,
}

impl LinkCatalogDocument {
    pub fn find_mut(&mut self, id: &str) -> Option<&mut LinkRecord> {
        self.urls.iter_mut().find(|r| r.id == id)
    }
}

/// The `state` document: global switch gating public resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceState {
    pub enabled: bool,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The `pins` document
///
/// Entries may be stored as JSON strings or numbers; both compare as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSet {
    #[serde(default)]
    pub pins: Vec<Value>,
}

pub const DEFAULT_PIN: &str = "1234";

impl Default for PinSet {
    fn default() -> Self {
        Self {
            pins: vec![Value::String(DEFAULT_PIN.to_string())],
        }
    }
}

impl PinSet {
    pub fn contains(&self, pin: &str) -> bool {
        self.pins
            .iter()
            .filter_map(pin_as_string)
            .any(|candidate| candidate == pin)
    }
}

/// Render a PIN-like JSON value as the string it is compared by.
pub fn pin_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn default_true() -> bool {
    true
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}
