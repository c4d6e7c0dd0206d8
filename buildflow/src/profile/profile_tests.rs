//! Tests for profile resolution, dependencies and documents.

#[cfg(test)]
mod tests {
    use crate::core::{Capability, Component, ComponentRegistry, ComponentType, TypeKey};
    use crate::errors::ProfileError;
    use crate::profile::{ComponentSource, Profile, ProfileCatalog, ProfileId};
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    struct PlatformTarget;

    impl Capability for PlatformTarget {
        const NAME: &'static str = "PlatformTarget";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct DesktopTarget {
        arch: String,
    }

    impl ComponentType for DesktopTarget {
        const TYPE_NAME: &'static str = "DesktopTarget";

        fn capabilities() -> Vec<TypeKey> {
            vec![TypeKey::capability::<PlatformTarget>()]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct MobileTarget {
        os: String,
    }

    impl ComponentType for MobileTarget {
        const TYPE_NAME: &'static str = "MobileTarget";

        fn capabilities() -> Vec<TypeKey> {
            vec![TypeKey::capability::<PlatformTarget>()]
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Compression(u8);

    impl ComponentType for Compression {
        const TYPE_NAME: &'static str = "Compression";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct OutputName(String);

    impl ComponentType for OutputName {
        const TYPE_NAME: &'static str = "OutputName";
    }

    fn catalog() -> ProfileCatalog {
        let types = ComponentRegistry::new();
        types.register::<DesktopTarget>().unwrap();
        types.register::<MobileTarget>().unwrap();
        types.register::<Compression>().unwrap();
        types.register::<OutputName>().unwrap();
        ProfileCatalog::new(Arc::new(types))
    }

    fn desktop(arch: &str) -> DesktopTarget {
        DesktopTarget { arch: arch.to_string() }
    }

    // === Component resolution ===

    #[test]
    fn test_own_component() {
        let profile = Profile::new();
        profile.set_component(Compression(3));

        assert_eq!(profile.get_component::<Compression>(), Some(Compression(3)));
        assert_eq!(profile.component_source(&TypeKey::of::<Compression>()), Some(ComponentSource::Own));
        assert!(!profile.is_component_inherited::<Compression>());
        assert!(!profile.is_component_overridden::<Compression>());
    }

    #[test]
    fn test_missing_component() {
        let profile = Profile::new();

        assert_eq!(profile.get_component::<Compression>(), None);
        assert!(!profile.has_component::<Compression>());
        assert_eq!(profile.get_component_or_default::<Compression>(), Compression(0));
        assert_eq!(profile.component_source(&TypeKey::of::<Compression>()), None);
    }

    #[test]
    fn test_set_component_replaces_in_place() {
        let profile = Profile::new();
        profile.set_component(Compression(1));
        profile.set_component(OutputName("game".into()));
        profile.set_component(Compression(9));

        let types: Vec<&str> = profile
            .own_components()
            .iter()
            .map(|component| component.type_key().name())
            .collect();

        assert_eq!(types, vec!["Compression", "OutputName"]);
        assert_eq!(profile.get_component::<Compression>(), Some(Compression(9)));
    }

    #[test]
    fn test_inherited_component() {
        let base = Profile::named("base");
        base.set_component(Compression(5));
        let child = Profile::named("child");
        assert_eq!(child.add_dependency(&base), Ok(true));

        assert_eq!(child.get_component::<Compression>(), Some(Compression(5)));
        assert!(child.is_component_inherited::<Compression>());
        assert!(!child.is_component_overridden::<Compression>());

        let resolved = child.resolve_component(&TypeKey::of::<Compression>()).unwrap();
        assert_eq!(resolved.provider, base.id());
        assert_eq!(resolved.source, ComponentSource::Inherited);
    }

    #[test]
    fn test_inherited_value_follows_dependency_changes() {
        let base = Profile::new();
        let child = Profile::new();
        child.add_dependency(&base).unwrap();

        base.set_component(Compression(1));
        assert_eq!(child.get_component::<Compression>(), Some(Compression(1)));

        base.set_component(Compression(2));
        assert_eq!(child.get_component::<Compression>(), Some(Compression(2)));
    }

    #[test]
    fn test_override_and_remove() {
        let base = Profile::new();
        base.set_component(Compression(5));
        let child = Profile::new();
        child.add_dependency(&base).unwrap();
        child.set_component(Compression(7));

        assert_eq!(child.get_component::<Compression>(), Some(Compression(7)));
        assert!(child.is_component_overridden::<Compression>());
        assert_eq!(base.get_component::<Compression>(), Some(Compression(5)));

        assert!(child.remove_component::<Compression>());
        assert_eq!(child.get_component::<Compression>(), Some(Compression(5)));
        assert!(child.is_component_inherited::<Compression>());
        assert!(!child.remove_component::<Compression>());
    }

    #[test]
    fn test_first_sibling_wins() {
        let first = Profile::new();
        first.set_component(Compression(1));
        let second = Profile::new();
        second.set_component(Compression(2));
        second.set_component(OutputName("second".into()));

        let child = Profile::new();
        child.add_dependency(&first).unwrap();
        child.add_dependency(&second).unwrap();

        assert_eq!(child.get_component::<Compression>(), Some(Compression(1)));
        assert_eq!(child.get_component::<OutputName>(), Some(OutputName("second".into())));
    }

    #[test]
    fn test_resolution_is_depth_first() {
        let grandparent = Profile::new();
        grandparent.set_component(Compression(1));
        let parent = Profile::new();
        parent.add_dependency(&grandparent).unwrap();
        let sibling = Profile::new();
        sibling.set_component(Compression(2));

        let child = Profile::new();
        child.add_dependency(&parent).unwrap();
        child.add_dependency(&sibling).unwrap();

        assert_eq!(child.get_component::<Compression>(), Some(Compression(1)));
    }

    #[test]
    fn test_capability_lookup() {
        let profile = Profile::new();
        profile.set_component(Compression(1));
        profile.set_component(desktop("x64"));

        let platform = profile.get_capability::<PlatformTarget>().unwrap();
        assert_eq!(platform.downcast_ref::<DesktopTarget>(), Some(&desktop("x64")));
        assert!(profile.has_component_dyn(&TypeKey::capability::<PlatformTarget>()));
    }

    #[test]
    fn test_capability_own_beats_inherited() {
        let base = Profile::new();
        base.set_component(desktop("x64"));
        let child = Profile::new();
        child.add_dependency(&base).unwrap();
        child.set_component(MobileTarget { os: "android".into() });

        let platform = TypeKey::capability::<PlatformTarget>();
        let value = child.get_component_dyn(&platform).unwrap();

        assert!(value.is::<MobileTarget>());
        assert!(child.is_component_overridden_dyn(&platform));
        assert!(child.is_component_inherited::<DesktopTarget>());
    }

    #[test]
    fn test_remove_by_capability_removes_all_local_matches() {
        let profile = Profile::new();
        profile.set_component(desktop("x64"));
        profile.set_component(MobileTarget { os: "ios".into() });
        profile.set_component(Compression(1));

        assert!(profile.remove_component_dyn(&TypeKey::capability::<PlatformTarget>()));
        assert_eq!(profile.own_components().len(), 1);
        assert!(profile.has_component::<Compression>());
    }

    #[test]
    fn test_get_components_merges_in_precedence_order() {
        let base = Profile::new();
        base.set_component(OutputName("base".into()));
        base.set_component(Compression(1));
        let child = Profile::new();
        child.add_dependency(&base).unwrap();
        child.set_component(Compression(4));

        let merged = child.get_components();
        let names: Vec<&str> = child
            .get_component_types()
            .iter()
            .map(TypeKey::name)
            .collect();

        assert_eq!(names, vec!["Compression", "OutputName"]);
        assert_eq!(merged[0].downcast_ref::<Compression>(), Some(&Compression(4)));
    }

    // === Dependencies ===

    #[test]
    fn test_add_dependency_rejects_self_and_duplicates() {
        let profile = Profile::new();
        let other = Profile::new();

        assert_eq!(profile.add_dependency(&profile), Ok(false));
        assert_eq!(profile.add_dependency(&other), Ok(true));
        assert_eq!(profile.add_dependency(&other), Ok(false));
        assert_eq!(profile.dependency_count(), 1);
    }

    #[test]
    fn test_add_dependency_rejects_cycle() {
        let a = Profile::named("a");
        let b = Profile::named("b");
        let c = Profile::named("c");
        a.add_dependency(&b).unwrap();
        b.add_dependency(&c).unwrap();

        assert_eq!(c.add_dependency(&a), Ok(false));
        assert!(c.dependencies().is_empty());
        assert!(a.depends_on(c.id()));
    }

    #[test]
    fn test_set_dependencies_reports_cycle() {
        let a = Profile::named("a");
        let b = Profile::named("b");
        a.add_dependency(&b).unwrap();

        let err = b.set_dependencies(vec![a.clone()]).unwrap_err();
        match err {
            ProfileError::Cycle(cycle) => assert_eq!(cycle.to_string(), "Cycle detected in profile dependencies: b -> a -> b"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(b.dependency_count(), 0);
    }

    #[test]
    fn test_set_dependencies_dedupes() {
        let profile = Profile::new();
        let a = Profile::new();
        let b = Profile::new();

        profile.set_dependencies(vec![a.clone(), b.clone(), a.clone()]).unwrap();
        assert_eq!(profile.dependencies(), vec![a, b]);
    }

    #[test]
    fn test_get_dependencies_closure() {
        // child -> (left -> shared), (right -> shared)
        let shared = Profile::named("shared");
        let left = Profile::named("left");
        let right = Profile::named("right");
        left.add_dependency(&shared).unwrap();
        right.add_dependency(&shared).unwrap();
        let child = Profile::named("child");
        child.add_dependency(&left).unwrap();
        child.add_dependency(&right).unwrap();

        assert_eq!(child.get_dependencies(), vec![left, shared, right]);
    }

    #[test]
    fn test_remove_and_clear_dependencies() {
        let profile = Profile::new();
        let a = Profile::new();
        let b = Profile::new();
        profile.add_dependency(&a).unwrap();
        profile.add_dependency(&b).unwrap();

        assert!(profile.remove_dependency(&a));
        assert!(!profile.has_dependency(&a));
        assert!(profile.has_dependency(&b));

        profile.clear_dependencies();
        assert_eq!(profile.dependency_count(), 0);
    }

    #[test]
    fn test_destroyed_dependency_becomes_placeholder() {
        let base = Profile::new();
        base.set_component(Compression(5));
        let child = Profile::new();
        child.add_dependency(&base).unwrap();

        base.destroy();

        assert!(base.is_destroyed());
        assert_eq!(child.dependency_count(), 1);
        assert!(child.dependencies().is_empty());
        assert!(child.get_dependencies().is_empty());
        assert_eq!(child.get_component::<Compression>(), None);
        assert_eq!(
            child.add_dependency(&base),
            Err(ProfileError::Destroyed { id: base.id() })
        );
    }

    #[test]
    fn test_dependency_outlives_dropped_handle() {
        let release = Profile::new();
        release
            .add_dependency(&Profile::create(|p| p.set_component(Compression(9))))
            .unwrap();

        assert_eq!(release.dependency_count(), 1);
        assert!(release.has_component::<Compression>());
        assert_eq!(release.get_component::<Compression>(), Some(Compression(9)));
        assert!(release.is_component_inherited::<Compression>());
    }

    // === Documents ===

    #[test]
    fn test_serialized_shape() {
        let catalog = catalog();
        let base = catalog.create();
        let profile = catalog.create_with(|p| {
            p.set_component(desktop("x64"));
            p.set_component(Compression(3));
        });
        profile.add_dependency(&base).unwrap();

        let json: serde_json::Value = serde_json::from_str(&profile.serialize_to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "Dependencies": [base.id().to_string()],
                "Components": [
                    { "$type": "DesktopTarget", "arch": "x64" },
                    { "$type": "Compression", "$value": 3 }
                ]
            })
        );
    }

    #[test]
    fn test_serialization_round_trip_is_stable() {
        let catalog = catalog();
        let base = catalog.create_with(|p| p.set_component(OutputName("base".into())));
        let profile = catalog.create_with(|p| {
            p.set_component(MobileTarget { os: "android".into() });
            p.set_component(Compression(7));
        });
        profile.add_dependency(&base).unwrap();

        let first = profile.serialize_to_json().unwrap();
        let (copy, report) = catalog.load(&first).unwrap();

        assert!(report.is_clean());
        assert_eq!(copy.serialize_to_json().unwrap(), first);
        assert_eq!(copy.get_component::<OutputName>(), Some(OutputName("base".into())));
    }

    #[test]
    fn test_placeholders_survive_round_trip() {
        let catalog = catalog();
        let unknown = ProfileId::new();
        let text = format!(r#"{{"Dependencies": ["{unknown}", null], "Components": []}}"#);

        let (profile, report) = catalog.load(&text).unwrap();

        assert_eq!(profile.dependency_count(), 2);
        assert_eq!(report.missing_dependencies, 2);
        assert!(profile.dependencies().is_empty());

        let (copy, _) = catalog.load(&profile.serialize_to_json().unwrap()).unwrap();
        assert_eq!(copy.serialize_to_json().unwrap(), profile.serialize_to_json().unwrap());
    }

    #[test]
    fn test_destroyed_dependency_is_serialized_by_id() {
        let catalog = catalog();
        let base = catalog.create();
        let profile = catalog.create();
        profile.add_dependency(&base).unwrap();
        catalog.destroy(&base);

        let json: serde_json::Value = serde_json::from_str(&profile.serialize_to_json().unwrap()).unwrap();
        assert_eq!(json["Dependencies"], serde_json::json!([base.id().to_string()]));
    }

    #[test]
    fn test_deserialize_skips_bad_entries() {
        let catalog = catalog();
        let base = catalog.create();
        let text = format!(
            r#"{{
                "Dependencies": ["{}", "not-a-uuid", 42],
                "Components": [
                    {{ "$type": "Compression", "$value": 2 }},
                    {{ "$type": "Unknown", "x": 1 }},
                    {{ "arch": "x64" }},
                    {{ "$type": "DesktopTarget", "arch": 12 }},
                    {{ "$type": "OutputName", "$value": "game" }}
                ]
            }}"#,
            base.id()
        );
        let target = catalog.create();

        let report = catalog.deserialize_into(&target, &text).unwrap();

        assert_eq!(report.dependencies_loaded, 1);
        assert_eq!(report.components_loaded, 2);
        assert_eq!(report.issues.len(), 5);
        assert!(target.has_dependency(&base));
        assert_eq!(target.get_component::<Compression>(), Some(Compression(2)));
        assert_eq!(target.get_component::<OutputName>(), Some(OutputName("game".into())));
        assert!(!target.has_component::<DesktopTarget>());
    }

    #[test]
    fn test_deserialize_replaces_previous_state() {
        let catalog = catalog();
        let old_dependency = catalog.create();
        let target = catalog.create_with(|p| p.set_component(Compression(1)));
        target.add_dependency(&old_dependency).unwrap();

        catalog
            .deserialize_into(&target, r#"{"Components": [{"$type": "OutputName", "$value": "new"}]}"#)
            .unwrap();

        assert_eq!(target.dependency_count(), 0);
        assert_eq!(target.own_components().len(), 1);
        assert!(!target.has_component::<Compression>());
    }

    #[test]
    fn test_deserialize_repeated_component_keeps_last() {
        let catalog = catalog();
        let target = catalog.create();
        let report = catalog
            .deserialize_into(
                &target,
                r#"{"Components": [{"$type": "Compression", "$value": 1}, {"$type": "Compression", "$value": 8}]}"#,
            )
            .unwrap();

        assert_eq!(report.components_loaded, 1);
        assert_eq!(target.get_component::<Compression>(), Some(Compression(8)));
    }

    #[test]
    fn test_deserialize_skips_cyclic_dependency() {
        let catalog = catalog();
        let target = catalog.create();
        let dependent = catalog.create();
        dependent.add_dependency(&target).unwrap();

        let text = format!(r#"{{"Dependencies": ["{}", "{}"]}}"#, dependent.id(), target.id());
        let report = catalog.deserialize_into(&target, &text).unwrap();

        assert_eq!(report.dependencies_loaded, 0);
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_malformed_document_leaves_target_untouched() {
        let catalog = catalog();
        let target = catalog.create_with(|p| p.set_component(Compression(4)));

        for text in ["{ not json", "[1, 2]", r#"{"Components": 3}"#] {
            let err = catalog.deserialize_into(&target, text).unwrap_err();
            assert!(matches!(err, ProfileError::MalformedDocument(_)));
        }
        assert_eq!(target.get_component::<Compression>(), Some(Compression(4)));
    }

    // === Catalog ===

    #[test]
    fn test_catalog_resolve_and_destroy() {
        let catalog = catalog();
        let profile = catalog.create();

        assert_eq!(catalog.resolve(profile.id()), Some(profile.clone()));
        assert_eq!(catalog.len(), 1);

        catalog.destroy(&profile);
        assert_eq!(catalog.resolve(profile.id()), None);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_catalog_forgets_dropped_profiles() {
        let catalog = catalog();
        let id = catalog.create().id();

        assert_eq!(catalog.resolve(id), None);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let catalog = catalog();
        assert!(catalog.load("nope").is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_erased_component_serializes() {
        let component: Arc<dyn Component> = Arc::new(Compression(6));
        assert_eq!(component.to_json().unwrap(), serde_json::json!(6));
    }
}
