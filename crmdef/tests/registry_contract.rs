use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crmdef::{
    FieldInput, FieldKind, FieldPatch, FieldType, ManualClock, MetadataRegistry, ObjectInput, RegistryError,
    validators::{validate_api_name, validate_field_type_attributes, validate_required_label},
};

fn project_input() -> ObjectInput {
    ObjectInput::new("Project__c", "Project")
        .plural_label("Projects")
        .description("Internal delivery projects")
}

#[test]
fn created_object_is_readable_with_no_fields() {
    let mut registry = MetadataRegistry::new();
    registry.create_object(project_input()).expect("object created");

    let object = registry.get_object("Project__c").expect("object found");
    assert_eq!(object.api_name, "Project__c");
    assert_eq!(object.label, "Project");
    assert_eq!(object.plural_label, "Projects");
    assert_eq!(object.description.as_deref(), Some("Internal delivery projects"));
    assert!(object.fields.is_empty());
    assert_eq!(object.record_count, 0);
    assert!(object.is_active);
}

#[test]
fn api_name_starting_with_digit_is_a_validation_error() {
    let mut registry = MetadataRegistry::new();
    let err = registry
        .create_object(ObjectInput::new("1Bad", "Bad"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));
}

#[test]
fn second_create_with_same_api_name_fails() {
    let mut registry = MetadataRegistry::new();
    registry.create_object(project_input()).expect("first create");
    let err = registry.create_object(project_input()).unwrap_err();
    assert!(err.is_validation());

    let matching = registry
        .list_objects()
        .into_iter()
        .filter(|object| object.api_name == "Project__c")
        .count();
    assert_eq!(matching, 1);
}

#[test]
fn picklist_without_options_leaves_field_count_unchanged() {
    let mut registry = MetadataRegistry::new();
    registry.create_object(project_input()).expect("object created");
    registry
        .create_field("Project__c", FieldInput::new("Code__c", "Code", FieldKind::text(12)))
        .expect("text field");

    let err = registry
        .create_field(
            "Project__c",
            FieldInput::new("Status__c", "Status", FieldKind::picklist(Vec::<String>::new())),
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(registry.list_fields("Project__c").expect("fields").len(), 1);
}

#[test]
fn deleting_object_removes_its_fields_and_later_lookups_are_not_found() {
    let mut registry = MetadataRegistry::new();
    registry.create_object(project_input()).expect("object created");
    for (name, kind) in [
        ("Code__c", FieldKind::text(12)),
        ("Budget__c", FieldKind::currency(12, 2)),
        ("Kickoff__c", FieldKind::Date),
    ] {
        registry
            .create_field("Project__c", FieldInput::new(name, name, kind))
            .expect("field created");
    }
    assert_eq!(registry.list_fields("Project__c").expect("fields").len(), 3);

    registry.delete_object("Project__c").expect("object deleted");

    assert!(registry.get_object("Project__c").unwrap_err().is_not_found());
    assert!(matches!(
        registry.list_fields("Project__c"),
        Err(RegistryError::NotFound { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn delete_of_missing_entities_is_not_found() {
    let mut registry = MetadataRegistry::new();
    assert!(registry.delete_object("Project__c").unwrap_err().is_not_found());
    registry.create_object(project_input()).expect("object created");
    assert!(registry.delete_field("Project__c", "00Nnope").unwrap_err().is_not_found());
}

#[test]
fn label_only_patch_preserves_everything_else() {
    let start = DateTime::<Utc>::from_timestamp(1_720_000_000, 0).expect("valid timestamp");
    let clock = ManualClock::new(start);
    let mut registry = MetadataRegistry::with_clock(Arc::new(clock.clone()));
    registry.create_object(project_input()).expect("object created");
    let original = registry
        .create_field(
            "Project__c",
            FieldInput::new("Budget__c", "Budget", FieldKind::currency(12, 2))
                .required()
                .unique()
                .help_text("Approved budget")
                .description("Set by finance")
                .default_value(1000),
        )
        .expect("field created");

    clock.advance(Duration::hours(2));
    let patched = registry
        .update_field("Project__c", &original.id, FieldPatch::default().label("New Label"))
        .expect("field patched");

    assert_eq!(patched.label, "New Label");
    assert_eq!(patched.id, original.id);
    assert_eq!(patched.api_name, "Budget__c");
    assert_eq!(patched.field_type(), FieldType::Currency);
    assert_eq!(patched.kind, original.kind);
    assert!(patched.required);
    assert!(patched.unique);
    assert_eq!(patched.help_text, original.help_text);
    assert_eq!(patched.description, original.description);
    assert_eq!(patched.default_value, original.default_value);
    assert_eq!(patched.is_custom, original.is_custom);
    assert_eq!(patched.created_at, original.created_at);
    assert_eq!(patched.updated_at, start + Duration::hours(2));

    let object = registry.get_object("Project__c").expect("object");
    assert_eq!(object.updated_at, start + Duration::hours(2));
    assert_eq!(object.created_at, start);
}

#[test]
fn standalone_validators_match_registry_rules() {
    assert!(validate_api_name("Project__c").is_ok());
    assert!(validate_api_name("1Bad").is_err());
    assert!(validate_required_label("").is_err());
    assert!(validate_field_type_attributes(&FieldKind::picklist(["Open"])).is_ok());
    assert!(validate_field_type_attributes(&FieldKind::picklist(Vec::<String>::new())).is_err());
}
