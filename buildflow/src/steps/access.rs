//! Checked component accessors for steps.
//!
//! A step's required and optional declarations form a closed manifest:
//! every accessor checks its query against the matching declaration before
//! touching the profile, and fails on anything undeclared.

use super::Step;
use crate::context::RunContext;
use crate::core::{Capability, Component, ComponentDescriptor, ComponentType, TypeKey};
use crate::errors::{AccessKind, ContractError};
use std::collections::HashSet;
use std::sync::Arc;

/// Component accessors checked against a step's own declarations.
///
/// Implemented for every [`Step`].
pub trait StepComponents: Step {
    /// Returns true if the declared required `T` is present.
    fn has_required_component<T: ComponentType>(&self, ctx: &RunContext) -> Result<bool, ContractError> {
        ensure_declared::<T, _>(self, AccessKind::Required)?;
        Ok(ctx.profile().has_component::<T>())
    }

    /// Returns true if a declared required type named `type_name` is present.
    fn has_required_component_by(&self, ctx: &RunContext, type_name: &str) -> Result<bool, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Required)?;
        let found = present(ctx, &matches).next().is_some();
        Ok(found)
    }

    /// Returns the value of the declared required `T`.
    fn get_required_component<T: ComponentType>(&self, ctx: &RunContext) -> Result<T, ContractError> {
        ensure_declared::<T, _>(self, AccessKind::Required)?;
        ctx.profile()
            .get_component::<T>()
            .ok_or_else(|| missing(self, T::TYPE_NAME))
    }

    /// Returns the value of the one declared required type named `type_name`.
    fn get_required_component_by(
        &self,
        ctx: &RunContext,
        type_name: &str,
    ) -> Result<Arc<dyn Component>, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Required)?;
        exactly_one(self, ctx, type_name, &matches)
    }

    /// Returns the value of the one declared required type satisfying `query`.
    fn get_required_component_of(
        &self,
        ctx: &RunContext,
        query: &TypeKey,
    ) -> Result<Arc<dyn Component>, ContractError> {
        let matches = declared_by_key(self, query, AccessKind::Required)?;
        exactly_one(self, ctx, query.name(), &matches)
    }

    /// Returns the value of the one declared required type satisfying `C`.
    fn get_required_capability<C: Capability>(&self, ctx: &RunContext) -> Result<Arc<dyn Component>, ContractError> {
        self.get_required_component_of(ctx, &TypeKey::capability::<C>())
    }

    /// Returns one value per declared required type, in declaration order.
    fn get_required_components(&self, ctx: &RunContext) -> Result<Vec<Arc<dyn Component>>, ContractError> {
        unique(self.required_components())
            .iter()
            .map(|descriptor| {
                ctx.profile()
                    .get_component_dyn(&descriptor.key())
                    .ok_or_else(|| missing(self, descriptor.name()))
            })
            .collect()
    }

    /// Returns the values of every declared required type satisfying `query`.
    ///
    /// Each matching declared type must be present exactly once.
    fn get_required_components_of(
        &self,
        ctx: &RunContext,
        query: &TypeKey,
    ) -> Result<Vec<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_key(self, query, AccessKind::Required)?;
        all_present(self, ctx, query.name(), &matches)
    }

    /// Returns the values of every declared required type named `type_name`.
    fn get_required_components_by(
        &self,
        ctx: &RunContext,
        type_name: &str,
    ) -> Result<Vec<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Required)?;
        all_present(self, ctx, type_name, &matches)
    }

    /// Returns true if the declared optional `T` is present.
    fn has_optional_component<T: ComponentType>(&self, ctx: &RunContext) -> Result<bool, ContractError> {
        ensure_declared::<T, _>(self, AccessKind::Optional)?;
        Ok(ctx.profile().has_component::<T>())
    }

    /// Returns true if a declared optional type named `type_name` is present.
    fn has_optional_component_by(&self, ctx: &RunContext, type_name: &str) -> Result<bool, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Optional)?;
        let found = present(ctx, &matches).next().is_some();
        Ok(found)
    }

    /// Returns the value of the declared optional `T`, if present.
    fn get_optional_component<T: ComponentType>(&self, ctx: &RunContext) -> Result<Option<T>, ContractError> {
        ensure_declared::<T, _>(self, AccessKind::Optional)?;
        Ok(ctx.profile().get_component::<T>())
    }

    /// Returns the first present declared optional type named `type_name`.
    fn get_optional_component_by(
        &self,
        ctx: &RunContext,
        type_name: &str,
    ) -> Result<Option<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Optional)?;
        let found = present(ctx, &matches).next();
        Ok(found)
    }

    /// Returns the first present declared optional type satisfying `query`.
    fn get_optional_component_of(
        &self,
        ctx: &RunContext,
        query: &TypeKey,
    ) -> Result<Option<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_key(self, query, AccessKind::Optional)?;
        let found = present(ctx, &matches).next();
        Ok(found)
    }

    /// Returns the first present declared optional type satisfying `C`.
    fn get_optional_capability<C: Capability>(
        &self,
        ctx: &RunContext,
    ) -> Result<Option<Arc<dyn Component>>, ContractError> {
        self.get_optional_component_of(ctx, &TypeKey::capability::<C>())
    }

    /// Returns the values of every present declared optional type.
    fn get_optional_components(&self, ctx: &RunContext) -> Vec<Arc<dyn Component>> {
        present(ctx, &unique(self.optional_components())).collect()
    }

    /// Returns the present values of declared optional types satisfying `query`.
    fn get_optional_components_of(
        &self,
        ctx: &RunContext,
        query: &TypeKey,
    ) -> Result<Vec<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_key(self, query, AccessKind::Optional)?;
        let found = present(ctx, &matches).collect();
        Ok(found)
    }

    /// Returns the present values of declared optional types named `type_name`.
    fn get_optional_components_by(
        &self,
        ctx: &RunContext,
        type_name: &str,
    ) -> Result<Vec<Arc<dyn Component>>, ContractError> {
        let matches = declared_by_name(self, type_name, AccessKind::Optional)?;
        let found = present(ctx, &matches).collect();
        Ok(found)
    }
}

impl<S: Step + ?Sized> StepComponents for S {}

fn declarations<S: Step + ?Sized>(step: &S, access: AccessKind) -> Vec<ComponentDescriptor> {
    unique(match access {
        AccessKind::Required => step.required_components(),
        AccessKind::Optional => step.optional_components(),
    })
}

fn unique(descriptors: Vec<ComponentDescriptor>) -> Vec<ComponentDescriptor> {
    let mut seen = HashSet::new();
    descriptors
        .into_iter()
        .filter(|descriptor| seen.insert(descriptor.key()))
        .collect()
}

fn undeclared<S: Step + ?Sized>(step: &S, component: &str, access: AccessKind) -> ContractError {
    ContractError::Undeclared {
        step: step.description().to_string(),
        component: component.to_string(),
        access,
    }
}

fn missing<S: Step + ?Sized>(step: &S, component: &str) -> ContractError {
    ContractError::MissingRequired {
        step: step.description().to_string(),
        component: component.to_string(),
    }
}

fn ensure_declared<T: ComponentType, S: Step + ?Sized>(step: &S, access: AccessKind) -> Result<(), ContractError> {
    let key = TypeKey::of::<T>();
    if declarations(step, access).iter().any(|descriptor| descriptor.key() == key) {
        Ok(())
    } else {
        Err(undeclared(step, T::TYPE_NAME, access))
    }
}

fn declared_by_key<S: Step + ?Sized>(
    step: &S,
    query: &TypeKey,
    access: AccessKind,
) -> Result<Vec<ComponentDescriptor>, ContractError> {
    let matches: Vec<_> = declarations(step, access)
        .into_iter()
        .filter(|descriptor| descriptor.satisfies(query))
        .collect();
    if matches.is_empty() {
        return Err(undeclared(step, query.name(), access));
    }
    Ok(matches)
}

fn declared_by_name<S: Step + ?Sized>(
    step: &S,
    type_name: &str,
    access: AccessKind,
) -> Result<Vec<ComponentDescriptor>, ContractError> {
    let type_name = type_name.trim();
    if type_name.is_empty() {
        return Err(ContractError::EmptyTypeToken {
            step: step.description().to_string(),
        });
    }

    let matches: Vec<_> = declarations(step, access)
        .into_iter()
        .filter(|descriptor| {
            descriptor.name() == type_name
                || descriptor
                    .capabilities()
                    .iter()
                    .any(|capability| capability.name() == type_name)
        })
        .collect();
    if matches.is_empty() {
        return Err(undeclared(step, type_name, access));
    }
    Ok(matches)
}

fn present<'a>(
    ctx: &'a RunContext,
    declared: &'a [ComponentDescriptor],
) -> impl Iterator<Item = Arc<dyn Component>> + 'a {
    declared
        .iter()
        .filter_map(|descriptor| ctx.profile().get_component_dyn(&descriptor.key()))
}

fn exactly_one<S: Step + ?Sized>(
    step: &S,
    ctx: &RunContext,
    query: &str,
    matches: &[ComponentDescriptor],
) -> Result<Arc<dyn Component>, ContractError> {
    match matches {
        [descriptor] => ctx
            .profile()
            .get_component_dyn(&descriptor.key())
            .ok_or_else(|| missing(step, descriptor.name())),
        _ => Err(ContractError::CardinalityMismatch {
            step: step.description().to_string(),
            query: query.to_string(),
            expected: 1,
            found: matches.len(),
        }),
    }
}

fn all_present<S: Step + ?Sized>(
    step: &S,
    ctx: &RunContext,
    query: &str,
    matches: &[ComponentDescriptor],
) -> Result<Vec<Arc<dyn Component>>, ContractError> {
    let values: Vec<_> = present(ctx, matches).collect();
    if values.len() == matches.len() {
        Ok(values)
    } else {
        Err(ContractError::CardinalityMismatch {
            step: step.description().to_string(),
            query: query.to_string(),
            expected: matches.len(),
            found: values.len(),
        })
    }
}
