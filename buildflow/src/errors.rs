//! Error types for the buildflow framework.
//!
//! Programming errors (contract violations, cycles, destroyed references)
//! are surfaced as typed errors. Expected absence is modelled with `Option`
//! and never reaches this module.

use crate::profile::ProfileId;
use std::fmt;
use thiserror::Error;

/// Stable error codes surfaced through [`BuildflowError::code`].
pub mod codes {
    /// A step queried a component type it did not declare.
    pub const UNDECLARED: &str = "CONTRACT-001-UNDECLARED";
    /// A runtime type token was empty.
    pub const EMPTY_TOKEN: &str = "CONTRACT-002-EMPTY_TOKEN";
    /// A declared required component was absent from the profile.
    pub const MISSING_REQUIRED: &str = "CONTRACT-003-MISSING_REQUIRED";
    /// A plural or exactly-one accessor resolved the wrong number of values.
    pub const CARDINALITY: &str = "CONTRACT-004-CARDINALITY";
    /// A profile dependency would introduce a cycle.
    pub const CYCLE: &str = "PROFILE-001-CYCLE";
    /// A destroyed profile was used where a live one is required.
    pub const DESTROYED: &str = "PROFILE-002-DESTROYED";
    /// A serialized profile document could not be parsed.
    pub const MALFORMED: &str = "PROFILE-003-MALFORMED";
    /// A component could not be serialized.
    pub const SERIALIZATION: &str = "PROFILE-004-SERIALIZATION";
    /// A component type name failed validation.
    pub const INVALID_TYPE_NAME: &str = "TYPES-001-INVALID_NAME";
    /// A component type name is already bound to another type.
    pub const DUPLICATE_TYPE_NAME: &str = "TYPES-002-DUPLICATE_NAME";
    /// An artifact store was attempted without a live profile.
    pub const MISSING_PROFILE: &str = "REGISTRY-001-MISSING_PROFILE";
    /// A pipeline's steps require components the profile lacks.
    pub const UNMET_REQUIREMENTS: &str = "PIPELINE-001-UNMET_REQUIREMENTS";
    /// Logging could not be initialised.
    pub const LOGGING: &str = "OBS-001-LOGGING";
}

/// The main error type for buildflow operations.
#[derive(Debug, Error)]
pub enum BuildflowError {
    /// A profile store error.
    #[error("{0}")]
    Profile(#[from] ProfileError),

    /// A step violated its component access contract.
    #[error("{0}")]
    Contract(#[from] ContractError),

    /// A component type could not be registered.
    #[error("{0}")]
    Registration(#[from] RegistrationError),

    /// The artifact registry rejected a store.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// A pipeline cannot build a profile.
    #[error("{0}")]
    CanBuild(#[from] CanBuildError),

    /// Logging initialisation failed.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl BuildflowError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Profile(err) => err.code(),
            Self::Contract(err) => err.code(),
            Self::Registration(err) => err.code(),
            Self::Registry(err) => err.code(),
            Self::CanBuild(err) => err.code(),
            Self::Logging(_) => codes::LOGGING,
        }
    }
}

/// Error raised when a dependency edge would close a cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cycle detected in profile dependencies: {}", .cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The profiles forming the cycle, first element repeated at the end.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

/// Errors raised by the profile store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// The referenced profile has been destroyed.
    #[error("Profile {id} has been destroyed")]
    Destroyed {
        /// The destroyed profile.
        id: ProfileId,
    },

    /// Adding a dependency would create a cycle.
    #[error("{0}")]
    Cycle(#[from] CycleDetectedError),

    /// The serialized document could not be parsed at all.
    #[error("Malformed profile document: {0}")]
    MalformedDocument(String),

    /// A component failed to serialize.
    #[error("Failed to serialize component '{component}': {message}")]
    Serialization {
        /// The component type name.
        component: String,
        /// The serializer message.
        message: String,
    },
}

impl ProfileError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Destroyed { .. } => codes::DESTROYED,
            Self::Cycle(_) => codes::CYCLE,
            Self::MalformedDocument(_) => codes::MALFORMED,
            Self::Serialization { .. } => codes::SERIALIZATION,
        }
    }
}

/// Which half of a step's declaration an access went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The required component list.
    Required,
    /// The optional component list.
    Optional,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
        }
    }
}

/// Violations of a step's declared component contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    /// A runtime type token was empty.
    #[error("Step '{step}' passed an empty component type token")]
    EmptyTypeToken {
        /// The step description.
        step: String,
    },

    /// The queried type is not part of the step's declaration.
    #[error("Step '{step}' accessed {access} component '{component}' which it did not declare as {access}")]
    Undeclared {
        /// The step description.
        step: String,
        /// The queried type name.
        component: String,
        /// Which list the access went through.
        access: AccessKind,
    },

    /// A declared required component is absent from the profile.
    #[error("Step '{step}' requires component '{component}' but the profile does not provide it")]
    MissingRequired {
        /// The step description.
        step: String,
        /// The missing type name.
        component: String,
    },

    /// A plural or exactly-one accessor saw the wrong number of values.
    #[error("Step '{step}' expected {expected} component(s) matching '{query}', found {found}")]
    CardinalityMismatch {
        /// The step description.
        step: String,
        /// The query type name.
        query: String,
        /// Expected number of values.
        expected: usize,
        /// Number of values resolved.
        found: usize,
    },
}

impl ContractError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTypeToken { .. } => codes::EMPTY_TOKEN,
            Self::Undeclared { .. } => codes::UNDECLARED,
            Self::MissingRequired { .. } => codes::MISSING_REQUIRED,
            Self::CardinalityMismatch { .. } => codes::CARDINALITY,
        }
    }
}

/// Errors raised while registering component types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The type name is not a valid identifier path.
    #[error("Invalid component type name '{0}'")]
    InvalidTypeName(String),

    /// The name is already bound to a different type.
    #[error("Component type name '{0}' is already registered for a different type")]
    DuplicateTypeName(String),
}

impl RegistrationError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTypeName(_) => codes::INVALID_TYPE_NAME,
            Self::DuplicateTypeName(_) => codes::DUPLICATE_TYPE_NAME,
        }
    }
}

/// Errors raised by the artifact registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The pipeline result does not reference a profile.
    #[error("Pipeline result '{0}' does not reference a profile")]
    MissingProfile(String),

    /// The referenced profile has been destroyed.
    #[error("Pipeline result references destroyed profile {0}")]
    DestroyedProfile(ProfileId),
}

impl RegistryError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingProfile(_) => codes::MISSING_PROFILE,
            Self::DestroyedProfile(_) => codes::DESTROYED,
        }
    }
}

/// A required component a step would not find in the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetRequirement {
    /// The step description.
    pub step: String,
    /// The missing component type name.
    pub component: &'static str,
}

impl fmt::Display for UnmetRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' needs '{}'", self.step, self.component)
    }
}

/// Raised by a dry check of a pipeline against a profile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Pipeline '{pipeline}' cannot build profile: {}", format_unmet(.unmet))]
pub struct CanBuildError {
    /// The pipeline description.
    pub pipeline: String,
    /// Every unmet requirement, in step order.
    pub unmet: Vec<UnmetRequirement>,
}

fn format_unmet(unmet: &[UnmetRequirement]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CanBuildError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        codes::UNMET_REQUIREMENTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(ProfileError::from(err).code(), codes::CYCLE);
    }

    #[test]
    fn test_contract_error_messages() {
        let err = ContractError::Undeclared {
            step: "compile".to_string(),
            component: "Target".to_string(),
            access: AccessKind::Optional,
        };

        let message = err.to_string();
        assert!(message.contains("compile"));
        assert!(message.contains("optional component 'Target'"));
        assert_eq!(err.code(), codes::UNDECLARED);
    }

    #[test]
    fn test_umbrella_code_passthrough() {
        let err: BuildflowError = RegistrationError::InvalidTypeName("1abc".to_string()).into();
        assert_eq!(err.code(), codes::INVALID_TYPE_NAME);

        let err: BuildflowError = ContractError::EmptyTypeToken {
            step: "s".to_string(),
        }
        .into();
        assert_eq!(err.code(), codes::EMPTY_TOKEN);
    }

    #[test]
    fn test_can_build_error_message() {
        let err = CanBuildError {
            pipeline: "release".to_string(),
            unmet: vec![
                UnmetRequirement { step: "compile".to_string(), component: "Target" },
                UnmetRequirement { step: "sign".to_string(), component: "Signing" },
            ],
        };

        assert_eq!(
            err.to_string(),
            "Pipeline 'release' cannot build profile: step 'compile' needs 'Target', step 'sign' needs 'Signing'"
        );
        assert_eq!(BuildflowError::from(err).code(), codes::UNMET_REQUIREMENTS);
    }

    #[test]
    fn test_access_kind_display() {
        assert_eq!(AccessKind::Required.to_string(), "required");
        assert_eq!(AccessKind::Optional.to_string(), "optional");
    }
}
