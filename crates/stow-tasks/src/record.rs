//! Task record types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, TaskError};
use crate::names::validate_task_id;

/// JSON keys owned by the well-known fields of [`TaskRecord`].
pub const RESERVED_KEYS: &[&str] = &["id", "status", "type", "priority"];

/// Task priority: either a label (`"high"`) or a JSON number (`2`, `1.5`).
///
/// Numbers are kept verbatim, so documents written by other tools round-trip
/// unchanged. Equality is exact and variant-sensitive: `Text("1")` never
/// equals `Number(1)`, and `1` never equals `1.0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Priority {
    Number(Number),
    Text(String),
}

impl Priority {
    /// Parse user input: numeric text becomes a number, anything else a label.
    pub fn parse(input: &str) -> Self {
        input
            .parse::<Number>()
            .map_or_else(|_| Self::Text(input.to_string()), Self::Number)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Number> for Priority {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

impl From<i64> for Priority {
    fn from(level: i64) -> Self {
        Self::Number(level.into())
    }
}

impl From<i32> for Priority {
    fn from(level: i32) -> Self {
        Self::Number(level.into())
    }
}

impl From<u64> for Priority {
    fn from(level: u64) -> Self {
        Self::Number(level.into())
    }
}

impl From<&str> for Priority {
    fn from(label: &str) -> Self {
        Self::Text(label.to_string())
    }
}

/// A mutable task document tracked by id.
///
/// Serialized as a flat JSON object: the well-known fields sit next to the
/// caller-defined fields in `extra`, and `kind` is spelled `"type"`. Absent
/// well-known fields are omitted rather than written as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Caller-defined fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    /// A record with only an id. Also the starting point for a patch.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Add a caller-defined field. Reserved keys are rejected at store time;
    /// use [`TaskRecord::set_field`] to route them to the typed fields.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Set any field by its JSON key.
    ///
    /// `status`, `type`, and `priority` are decoded into their typed fields;
    /// every other key except `id` lands in `extra`.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<()> {
        let mismatch = |expected: &str| {
            TaskError::InvalidArgument(format!("field {key:?} must be {expected}"))
        };
        match key {
            "id" => {
                return Err(TaskError::InvalidArgument(
                    "the id of an existing record cannot be reassigned".into(),
                ))
            }
            "status" => match value {
                Value::String(s) => self.status = Some(s),
                _ => return Err(mismatch("a string")),
            },
            "type" => match value {
                Value::String(s) => self.kind = Some(s),
                _ => return Err(mismatch("a string")),
            },
            "priority" => {
                let priority =
                    serde_json::from_value(value).map_err(|_| mismatch("a string or integer"))?;
                self.priority = Some(priority);
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Look up a caller-defined field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Check that the record can be stored: a usable id and no reserved key
    /// hiding in `extra`.
    pub fn validate(&self) -> Result<()> {
        validate_task_id(&self.id)?;
        if let Some(key) = RESERVED_KEYS.iter().find(|k| self.extra.contains_key(**k)) {
            return Err(TaskError::InvalidArgument(format!(
                "{key:?} is a reserved field and cannot be set as an extension field"
            )));
        }
        Ok(())
    }

    /// Shallow-merge `patch` into `self`.
    ///
    /// Well-known fields set in the patch and every extension key in the
    /// patch overwrite; all other fields keep their values. The id is never
    /// changed.
    pub fn merge(&mut self, patch: &TaskRecord) {
        if let Some(status) = &patch.status {
            self.status = Some(status.clone());
        }
        if let Some(kind) = &patch.kind {
            self.kind = Some(kind.clone());
        }
        if let Some(priority) = &patch.priority {
            self.priority = Some(priority.clone());
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Decode a record from a JSON document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| TaskError::Serialization {
            id: String::new(),
            reason: e.to_string(),
        })
    }

    /// Encode as a pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| TaskError::Serialization {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}
