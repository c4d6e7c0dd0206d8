//! Artifact marker and a general-purpose artifact type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Conversion to `Any`, implemented for every sized `'static` type.
pub trait AsAny: Any + Send + Sync {
    /// Borrows the value as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared handle into an `Any` handle for downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Marker for outputs that can be kept in the artifact registry.
///
/// Carries no members of its own; implement it with an empty block.
pub trait Artifact: AsAny + Debug {}

/// A named, structured artifact.
///
/// Useful for reports and manifests that do not warrant a dedicated type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArtifact {
    /// The kind of artifact (e.g. "report", "manifest").
    pub kind: String,

    /// The name of the artifact.
    pub name: String,

    /// The artifact payload.
    pub data: serde_json::Value,

    /// Additional metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the artifact was created.
    pub created_at: DateTime<Utc>,
}

impl NamedArtifact {
    /// Creates a new artifact.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            data,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds metadata to the artifact.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Artifact for NamedArtifact {}
