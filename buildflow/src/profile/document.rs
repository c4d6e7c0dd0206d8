//! JSON document form of a profile.
//!
//! ```json
//! {
//!   "Dependencies": ["<uuid>", null],
//!   "Components": [
//!     { "$type": "DesktopTarget", "arch": "x64" },
//!     { "$type": "Scalar", "$value": 3 }
//!   ]
//! }
//! ```

use super::catalog::ProfileCatalog;
use super::store::{DependencySlot, Profile};
use super::ProfileId;
use crate::core::Component;
use crate::errors::ProfileError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

const TYPE_FIELD: &str = "$type";
const VALUE_FIELD: &str = "$value";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(rename = "Dependencies", default)]
    dependencies: Vec<Value>,
    #[serde(rename = "Components", default)]
    components: Vec<Value>,
}

/// Outcome of loading a document into a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeserializeReport {
    /// Dependency entries kept, placeholders included.
    pub dependencies_loaded: usize,
    /// Kept dependency entries that could not be resolved.
    pub missing_dependencies: usize,
    /// Component entries loaded.
    pub components_loaded: usize,
    /// One message per skipped or replaced entry.
    pub issues: Vec<String>,
}

impl DeserializeReport {
    /// Returns true if every entry was loaded as written.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, message: String) {
        self.issues.push(message);
    }
}

impl Profile {
    /// Serializes the profile's own components and raw dependency list.
    ///
    /// Missing dependencies are written as their id, or `null` when the id
    /// is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Serialization`] if a component value cannot
    /// be represented as JSON.
    pub fn serialize_to_json(&self) -> Result<String, ProfileError> {
        let document = ProfileDocument {
            dependencies: self
                .dependency_slots()
                .iter()
                .map(|slot| slot.id.map_or(Value::Null, |id| Value::String(id.to_string())))
                .collect(),
            components: self
                .own_components()
                .iter()
                .map(|component| encode_component(component.as_ref()))
                .collect::<Result<_, _>>()?,
        };

        serde_json::to_string_pretty(&document).map_err(|err| ProfileError::Serialization {
            component: "profile".to_string(),
            message: err.to_string(),
        })
    }
}

fn encode_component(component: &dyn Component) -> Result<Value, ProfileError> {
    let type_name = component.type_key().name();
    let payload = component
        .to_json()
        .map_err(|err| ProfileError::Serialization {
            component: type_name.to_string(),
            message: err.to_string(),
        })?;

    let mut entry = Map::new();
    entry.insert(TYPE_FIELD.to_string(), Value::String(type_name.to_string()));
    match payload {
        Value::Object(fields) => entry.extend(fields),
        other => {
            entry.insert(VALUE_FIELD.to_string(), other);
        }
    }
    Ok(Value::Object(entry))
}

/// Replaces the state of `target` with the document in `text`.
pub(crate) fn decode(
    catalog: &ProfileCatalog,
    target: &Profile,
    text: &str,
) -> Result<DeserializeReport, ProfileError> {
    if target.is_destroyed() {
        return Err(ProfileError::Destroyed { id: target.id() });
    }

    let document = parse_document(text).map_err(|message| {
        error!(profile = %target.id(), error = %message, "Malformed profile document");
        ProfileError::MalformedDocument(message)
    })?;

    let mut report = DeserializeReport::default();
    let dependencies = decode_dependencies(catalog, target, document.dependencies, &mut report);
    let components = decode_components(catalog, document.components, &mut report);

    report.dependencies_loaded = dependencies.len();
    report.components_loaded = components.len();
    target.replace_state(components, dependencies);

    debug!(
        profile = %target.id(),
        dependencies = report.dependencies_loaded,
        components = report.components_loaded,
        issues = report.issues.len(),
        "Profile document loaded"
    );
    Ok(report)
}

fn parse_document(text: &str) -> Result<ProfileDocument, String> {
    let root: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
    if !root.is_object() {
        return Err("document root must be an object".to_string());
    }
    serde_json::from_value(root).map_err(|err| err.to_string())
}

fn decode_dependencies(
    catalog: &ProfileCatalog,
    target: &Profile,
    entries: Vec<Value>,
    report: &mut DeserializeReport,
) -> Vec<DependencySlot> {
    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let id = match entry {
            Value::Null => {
                report.missing_dependencies += 1;
                slots.push(DependencySlot::placeholder(None));
                continue;
            }
            Value::String(raw) => match raw.parse::<ProfileId>() {
                Ok(id) => id,
                Err(err) => {
                    error!(index, value = %raw, error = %err, "Skipping dependency with invalid id");
                    report.issue(format!("dependency {index}: invalid id '{raw}'"));
                    continue;
                }
            },
            other => {
                error!(index, value = %other, "Skipping dependency of unexpected shape");
                report.issue(format!("dependency {index}: expected id or null, found {other}"));
                continue;
            }
        };

        if !seen.insert(id) {
            warn!(index, dependency = %id, "Skipping repeated dependency");
            report.issue(format!("dependency {index}: repeated id {id}"));
            continue;
        }

        match catalog.resolve(id) {
            Some(dependency) if dependency.id() == target.id() || dependency.depends_on(target.id()) => {
                error!(index, dependency = %id, "Skipping dependency that would form a cycle");
                report.issue(format!("dependency {index}: {id} would form a cycle"));
            }
            Some(dependency) => slots.push(DependencySlot::linked(&dependency)),
            None => {
                debug!(index, dependency = %id, "Keeping unresolved dependency as placeholder");
                report.missing_dependencies += 1;
                slots.push(DependencySlot::placeholder(Some(id)));
            }
        }
    }
    slots
}

fn decode_components(
    catalog: &ProfileCatalog,
    entries: Vec<Value>,
    report: &mut DeserializeReport,
) -> Vec<Arc<dyn Component>> {
    let mut components: Vec<Arc<dyn Component>> = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let component = match decode_component(catalog, entry) {
            Ok(component) => component,
            Err(message) => {
                error!(index, reason = %message, "Skipping component entry");
                report.issue(format!("component {index}: {message}"));
                continue;
            }
        };

        let key = component.type_key();
        match components.iter_mut().find(|existing| existing.type_key() == key) {
            Some(existing) => {
                warn!(index, component = %key, "Repeated component entry replaces earlier one");
                report.issue(format!("component {index}: {key} replaces an earlier entry"));
                *existing = component;
            }
            None => components.push(component),
        }
    }
    components
}

fn decode_component(catalog: &ProfileCatalog, entry: Value) -> Result<Arc<dyn Component>, String> {
    let mut fields = match entry {
        Value::Object(fields) => fields,
        other => return Err(format!("expected an object, found {other}")),
    };

    let type_name = match fields.remove(TYPE_FIELD) {
        Some(Value::String(name)) => name,
        Some(other) => return Err(format!("'{TYPE_FIELD}' must be a string, found {other}")),
        None => return Err(format!("missing '{TYPE_FIELD}'")),
    };

    let descriptor = catalog
        .types()
        .get(&type_name)
        .ok_or_else(|| format!("unknown component type '{type_name}'"))?;

    let payload = if fields.len() == 1 && fields.contains_key(VALUE_FIELD) {
        fields.remove(VALUE_FIELD).unwrap_or(Value::Null)
    } else {
        Value::Object(fields)
    };

    descriptor
        .deserialize(payload)
        .map_err(|err| format!("invalid '{type_name}' payload: {err}"))
}
