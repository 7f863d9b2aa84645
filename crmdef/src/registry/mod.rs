//! In-memory registry of object and field definitions.
//!
//! [`MetadataRegistry`] is the single source of truth for a session. Every
//! mutation validates its whole input first and only then touches state, so a
//! failed call never leaves a partial change behind.

mod records;
mod relations;

pub use records::{Record, RecordValues};
pub use relations::{Relationship, RelationshipDirection};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    clock::{Clock, SystemClock},
    errors::{EntityKind, RegistryError, RegistryResult, ValidationError, ValidationIssue, ValidationResult},
    id,
    types::{Field, FieldInput, FieldKind, FieldPatch, MetadataObject, ObjectInput, ObjectPatch},
    validators::{
        is_valid_api_name, validate_api_name, validate_default_value, validate_field_type_attributes,
        validate_required_label,
    },
};

#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    objects: IndexMap<String, MetadataObject>,
    records: records::RecordStore,
    clock: Arc<dyn Clock>,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_issues(issues: &mut Vec<ValidationIssue>, result: ValidationResult<()>) {
    if let Err(err) = result {
        issues.extend(err.issues);
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: IndexMap::new(),
            records: records::RecordStore::default(),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains_object(&self, api_name: &str) -> bool {
        self.objects.contains_key(api_name)
    }

    /// All objects in creation order.
    pub fn list_objects(&self) -> Vec<&MetadataObject> {
        self.objects.values().collect()
    }

    pub fn get_object(&self, api_name: &str) -> RegistryResult<&MetadataObject> {
        self.objects
            .get(api_name)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Object, api_name))
    }

    fn object_mut(&mut self, api_name: &str) -> RegistryResult<&mut MetadataObject> {
        self.objects
            .get_mut(api_name)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Object, api_name))
    }

    /// API names are unique regardless of ASCII case.
    fn find_object_ignoring_case(&self, api_name: &str) -> Option<&MetadataObject> {
        self.objects
            .values()
            .find(|object| object.api_name.eq_ignore_ascii_case(api_name))
    }

    pub fn create_object(&mut self, input: ObjectInput) -> RegistryResult<MetadataObject> {
        let mut issues = Vec::new();
        collect_issues(&mut issues, validate_api_name(&input.api_name));
        collect_issues(&mut issues, validate_required_label(&input.label));
        if let Some(existing) = self.find_object_ignoring_case(&input.api_name) {
            issues.push(ValidationIssue::new(
                "apiName",
                "api_name.duplicate",
                format!("an object with API name '{}' already exists", existing.api_name),
            ));
        }
        ValidationError::into_result(issues)?;

        let now = self.now();
        let plural_label = non_blank(input.plural_label).unwrap_or_else(|| input.label.clone());
        let object = MetadataObject {
            id: id::generate_object_id(),
            api_name: input.api_name,
            label: input.label,
            plural_label,
            description: non_blank(input.description),
            is_custom: input.is_custom,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
            fields: Vec::new(),
            record_count: 0,
        };
        self.objects.insert(object.api_name.clone(), object.clone());
        Ok(object)
    }

    pub fn update_object(&mut self, api_name: &str, patch: ObjectPatch) -> RegistryResult<MetadataObject> {
        self.get_object(api_name)?;

        let mut issues = Vec::new();
        if let Some(label) = &patch.label {
            collect_issues(&mut issues, validate_required_label(label));
        }
        if let Some(plural_label) = &patch.plural_label
            && plural_label.trim().is_empty()
        {
            issues.push(ValidationIssue::new(
                "pluralLabel",
                "plural_label.required",
                "Plural label is required",
            ));
        }
        ValidationError::into_result(issues)?;

        let now = self.now();
        let object = self.object_mut(api_name)?;
        if let Some(label) = patch.label {
            object.label = label;
        }
        if let Some(plural_label) = patch.plural_label {
            object.plural_label = plural_label;
        }
        if let Some(description) = patch.description {
            object.description = non_blank(Some(description));
        }
        if let Some(is_active) = patch.is_active {
            object.is_active = is_active;
        }
        object.updated_at = now;
        Ok(object.clone())
    }

    /// Removes an object together with its fields and records.
    ///
    /// Unknown API names are reported as not found. An object that other
    /// objects still point at through Lookup or MasterDetail fields cannot be
    /// removed until those fields are deleted.
    pub fn delete_object(&mut self, api_name: &str) -> RegistryResult<()> {
        self.get_object(api_name)?;

        let referencing: Vec<String> = self
            .objects
            .values()
            .filter(|object| object.api_name != api_name)
            .flat_map(|object| {
                object
                    .fields
                    .iter()
                    .filter(|field| field.kind.reference_object() == Some(api_name))
                    .map(move |field| format!("{}.{}", object.api_name, field.api_name))
            })
            .collect();
        if !referencing.is_empty() {
            return Err(ValidationError::single(
                "apiName",
                "object.referenced",
                format!("'{api_name}' is referenced by {}", referencing.join(", ")),
            )
            .into());
        }

        if let Some(removed) = self.objects.shift_remove(api_name) {
            self.records.drop_object(&removed);
        }
        Ok(())
    }

    /// Fields of an object in creation order.
    pub fn list_fields(&self, object_api_name: &str) -> RegistryResult<&[Field]> {
        Ok(&self.get_object(object_api_name)?.fields)
    }

    pub fn get_field(&self, object_api_name: &str, field_id: &str) -> RegistryResult<&Field> {
        self.get_object(object_api_name)?
            .field(field_id)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Field, field_id))
    }

    pub fn get_field_by_api_name(&self, object_api_name: &str, field_api_name: &str) -> RegistryResult<&Field> {
        self.get_object(object_api_name)?
            .field_by_api_name(field_api_name)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Field, format!("{object_api_name}.{field_api_name}")))
    }

    pub fn create_field(&mut self, object_api_name: &str, input: FieldInput) -> RegistryResult<Field> {
        let object = self.get_object(object_api_name)?;

        let mut issues = Vec::new();
        collect_issues(&mut issues, validate_api_name(&input.api_name));
        collect_issues(&mut issues, validate_required_label(&input.label));
        if let Some(existing) = object
            .fields
            .iter()
            .find(|field| field.api_name.eq_ignore_ascii_case(&input.api_name))
        {
            issues.push(ValidationIssue::new(
                "apiName",
                "api_name.duplicate",
                format!("field '{}' already exists on {object_api_name}", existing.api_name),
            ));
        }
        issues.extend(self.definition_issues(&input.kind, input.required, input.unique, input.default_value.as_ref()));

        let now = self.now();
        let field = Field {
            id: id::generate_field_id(),
            api_name: input.api_name,
            label: input.label,
            kind: input.kind,
            required: input.required,
            unique: input.unique,
            help_text: non_blank(input.help_text),
            description: non_blank(input.description),
            is_custom: input.is_custom,
            default_value: input.default_value.filter(|value| !value.is_null()),
            created_at: now,
            updated_at: now,
        };
        issues.extend(self.records.compatibility_issues(object_api_name, &field));
        ValidationError::into_result(issues)?;

        let object = self.object_mut(object_api_name)?;
        object.fields.push(field.clone());
        object.updated_at = now;
        Ok(field)
    }

    /// Applies a partial update; members the patch leaves unset keep their value.
    pub fn update_field(&mut self, object_api_name: &str, field_id: &str, patch: FieldPatch) -> RegistryResult<Field> {
        let current = self.get_field(object_api_name, field_id)?;
        let mut updated = current.clone();
        let mut issues = Vec::new();

        if let Some(label) = patch.label {
            collect_issues(&mut issues, validate_required_label(&label));
            updated.label = label;
        }
        if let Some(kind) = patch.attributes {
            if kind.field_type() == current.field_type() {
                updated.kind = kind;
            } else {
                issues.push(ValidationIssue::new(
                    "type",
                    "field.type_change",
                    format!(
                        "field type cannot change from {} to {}",
                        current.field_type(),
                        kind.field_type()
                    ),
                ));
            }
        }
        if let Some(required) = patch.required {
            updated.required = required;
        }
        if let Some(unique) = patch.unique {
            updated.unique = unique;
        }
        if let Some(help_text) = patch.help_text {
            updated.help_text = non_blank(Some(help_text));
        }
        if let Some(description) = patch.description {
            updated.description = non_blank(Some(description));
        }
        if patch.clear_default_value {
            updated.default_value = None;
        } else if let Some(default_value) = patch.default_value.filter(|value| !value.is_null()) {
            updated.default_value = Some(default_value);
        }

        issues.extend(self.definition_issues(
            &updated.kind,
            updated.required,
            updated.unique,
            updated.default_value.as_ref(),
        ));
        issues.extend(self.records.compatibility_issues(object_api_name, &updated));
        ValidationError::into_result(issues)?;

        let now = self.now();
        updated.updated_at = now;
        let object = self.object_mut(object_api_name)?;
        if let Some(slot) = object.fields.iter_mut().find(|field| field.id == field_id) {
            *slot = updated.clone();
        }
        object.updated_at = now;
        Ok(updated)
    }

    /// Removes a field and its stored values. Unknown objects or fields are reported as not found.
    pub fn delete_field(&mut self, object_api_name: &str, field_id: &str) -> RegistryResult<()> {
        let now = self.now();
        let object = self.object_mut(object_api_name)?;
        let position = object
            .fields
            .iter()
            .position(|field| field.id == field_id)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Field, field_id))?;
        let removed = object.fields.remove(position);
        object.updated_at = now;
        self.records.drop_field(object_api_name, &removed);
        Ok(())
    }

    /// Checks that hold for a field definition regardless of which object owns it.
    fn definition_issues(
        &self,
        kind: &FieldKind,
        required: bool,
        unique: bool,
        default_value: Option<&Value>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let field_type = kind.field_type();

        collect_issues(&mut issues, validate_field_type_attributes(kind));
        if let Some(reference) = kind.reference_object()
            && is_valid_api_name(reference)
            && !self.objects.contains_key(reference)
        {
            issues.push(ValidationIssue::new(
                "referenceObject",
                "reference.not_found",
                format!("referenced object '{reference}' does not exist"),
            ));
        }
        if required && field_type.is_read_only() {
            issues.push(ValidationIssue::new(
                "required",
                "field.read_only_required",
                format!("{field_type} fields cannot be required"),
            ));
        }
        if unique && !field_type.supports_unique() {
            issues.push(ValidationIssue::new(
                "unique",
                "field.unique_unsupported",
                format!("{field_type} fields cannot be unique"),
            ));
        }
        if let Some(value) = default_value {
            collect_issues(&mut issues, validate_default_value(kind, value));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use super::*;
    use crate::{
        clock::ManualClock,
        types::{FieldType, FieldKind},
        validators::{API_NAME_MESSAGE, LABEL_REQUIRED_MESSAGE},
    };

    fn registry_with_clock() -> (MetadataRegistry, ManualClock) {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let clock = ManualClock::new(start);
        (MetadataRegistry::with_clock(Arc::new(clock.clone())), clock)
    }

    fn project(registry: &mut MetadataRegistry) -> MetadataObject {
        registry
            .create_object(ObjectInput::new("Project__c", "Project").plural_label("Projects"))
            .expect("project created")
    }

    #[test]
    fn create_then_get_round_trips() {
        let mut registry = MetadataRegistry::new();
        let created = project(&mut registry);
        let fetched = registry.get_object("Project__c").expect("project exists");
        assert_eq!(fetched.api_name, "Project__c");
        assert_eq!(fetched.label, "Project");
        assert_eq!(fetched.plural_label, "Projects");
        assert!(fetched.fields.is_empty());
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.created_at, fetched.updated_at);
        assert!(fetched.is_custom);
    }

    #[test]
    fn malformed_api_name_is_rejected() {
        let mut registry = MetadataRegistry::new();
        let err = registry.create_object(ObjectInput::new("1Bad", "Bad")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.issues()[0].message, API_NAME_MESSAGE);
        assert!(registry.is_empty());
    }

    #[test]
    fn blank_label_is_rejected() {
        let mut registry = MetadataRegistry::new();
        let err = registry.create_object(ObjectInput::new("Thing__c", " ")).unwrap_err();
        assert_eq!(err.issues()[0].message, LABEL_REQUIRED_MESSAGE);
    }

    #[test]
    fn duplicate_api_name_is_rejected() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let err = registry
            .create_object(ObjectInput::new("Project__c", "Other"))
            .unwrap_err();
        assert!(err.is_validation());
        let err = registry
            .create_object(ObjectInput::new("project__C", "Other"))
            .unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "api_name.duplicate"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_object("Project__c").map(|o| o.label.as_str()).ok(), Some("Project"));
    }

    #[test]
    fn plural_label_falls_back_to_label() {
        let mut registry = MetadataRegistry::new();
        let created = registry.create_object(ObjectInput::new("Asset__c", "Asset")).expect("created");
        assert_eq!(created.plural_label, "Asset");
    }

    #[test]
    fn list_objects_keeps_creation_order() {
        let mut registry = MetadataRegistry::new();
        for name in ["Zeta__c", "Alpha__c", "Mid__c"] {
            registry.create_object(ObjectInput::new(name, name)).expect("created");
        }
        registry.delete_object("Alpha__c").expect("deleted");
        registry.create_object(ObjectInput::new("Alpha__c", "Alpha")).expect("recreated");
        let names: Vec<_> = registry.list_objects().iter().map(|o| o.api_name.as_str()).collect();
        assert_eq!(names, ["Zeta__c", "Mid__c", "Alpha__c"]);
    }

    #[test]
    fn update_object_touches_updated_at() {
        let (mut registry, clock) = registry_with_clock();
        let created = project(&mut registry);
        clock.advance(Duration::minutes(1));
        let updated = registry
            .update_object("Project__c", ObjectPatch::default().label("Initiative").active(false))
            .expect("updated");
        assert_eq!(updated.label, "Initiative");
        assert_eq!(updated.plural_label, "Projects");
        assert!(!updated.is_active);
        assert_eq!(updated.api_name, created.api_name);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_unknown_object_is_not_found() {
        let mut registry = MetadataRegistry::new();
        let err = registry
            .update_object("Missing__c", ObjectPatch::default().label("X"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn picklist_without_options_is_rejected() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let input = FieldInput::new("Status__c", "Status", FieldKind::picklist(Vec::<String>::new()));
        let err = registry.create_field("Project__c", input).unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "options.required"));
        assert_eq!(registry.list_fields("Project__c").map(|f| f.len()).ok(), Some(0));
    }

    #[test]
    fn field_on_missing_object_is_not_found() {
        let mut registry = MetadataRegistry::new();
        let err = registry
            .create_field("Missing__c", FieldInput::new("Name__c", "Name", FieldKind::text(80)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn duplicate_field_api_name_is_scoped_per_object() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        registry.create_object(ObjectInput::new("Task__c", "Task")).expect("created");
        let name = || FieldInput::new("Code__c", "Code", FieldKind::text(20));
        registry.create_field("Project__c", name()).expect("first");
        registry.create_field("Task__c", name()).expect("other object is fine");
        let err = registry.create_field("Project__c", name()).unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "api_name.duplicate"));
    }

    #[test]
    fn lookup_requires_existing_reference() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let err = registry
            .create_field("Project__c", FieldInput::new("Account__c", "Account", FieldKind::lookup("Account")))
            .unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "reference.not_found"));

        registry.create_object(ObjectInput::new("Account", "Account").standard()).expect("account");
        registry
            .create_field("Project__c", FieldInput::new("Account__c", "Account", FieldKind::lookup("Account")))
            .expect("lookup created");
    }

    #[test]
    fn field_definition_rules() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let formula = FieldInput::new("Score__c", "Score", FieldKind::formula("1 + 1", FieldType::Number)).required();
        let err = registry.create_field("Project__c", formula).unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "field.read_only_required"));

        let unique_checkbox = FieldInput::new("Flag__c", "Flag", FieldKind::Checkbox).unique();
        let err = registry.create_field("Project__c", unique_checkbox).unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "field.unique_unsupported"));

        let bad_default = FieldInput::new("Budget__c", "Budget", FieldKind::currency(5, 2)).default_value(json!("lots"));
        assert!(registry.create_field("Project__c", bad_default).is_err());
    }

    #[test]
    fn update_field_label_preserves_other_attributes() {
        let (mut registry, clock) = registry_with_clock();
        project(&mut registry);
        let created = registry
            .create_field(
                "Project__c",
                FieldInput::new("Status__c", "Status", FieldKind::picklist(["Open", "Closed"]))
                    .required()
                    .help_text("Lifecycle stage")
                    .default_value("Open"),
            )
            .expect("field created");
        clock.advance(Duration::seconds(30));

        let updated = registry
            .update_field("Project__c", &created.id, FieldPatch::default().label("New Label"))
            .expect("field updated");
        assert_eq!(updated.label, "New Label");
        assert_eq!(updated.api_name, created.api_name);
        assert_eq!(updated.kind, created.kind);
        assert_eq!(updated.required, created.required);
        assert_eq!(updated.unique, created.unique);
        assert_eq!(updated.help_text, created.help_text);
        assert_eq!(updated.default_value, created.default_value);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(registry.get_field("Project__c", &created.id).ok(), Some(&updated));
    }

    #[test]
    fn update_field_cannot_change_type() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let field = registry
            .create_field("Project__c", FieldInput::new("Code__c", "Code", FieldKind::text(10)))
            .expect("created");
        let err = registry
            .update_field("Project__c", &field.id, FieldPatch::default().attributes(FieldKind::number(5, 0)))
            .unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "field.type_change"));

        let widened = registry
            .update_field("Project__c", &field.id, FieldPatch::default().attributes(FieldKind::text(40)))
            .expect("same type");
        assert_eq!(widened.kind, FieldKind::text(40));
    }

    #[test]
    fn update_and_delete_missing_field_are_not_found() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        assert!(
            registry
                .update_field("Project__c", "00Nmissing", FieldPatch::default().label("X"))
                .unwrap_err()
                .is_not_found()
        );
        assert!(registry.delete_field("Project__c", "00Nmissing").unwrap_err().is_not_found());
        assert!(registry.delete_field("Missing__c", "00Nmissing").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_field_keeps_remaining_order() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        let ids: Vec<String> = ["A__c", "B__c", "C__c"]
            .into_iter()
            .map(|name| {
                registry
                    .create_field("Project__c", FieldInput::new(name, name, FieldKind::Checkbox))
                    .expect("created")
                    .id
            })
            .collect();
        registry.delete_field("Project__c", &ids[1]).expect("deleted");
        let names: Vec<_> = registry
            .list_fields("Project__c")
            .expect("fields")
            .iter()
            .map(|field| field.api_name.as_str())
            .collect();
        assert_eq!(names, ["A__c", "C__c"]);
    }

    #[test]
    fn delete_object_cascades_fields() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        for name in ["A__c", "B__c", "C__c"] {
            registry
                .create_field("Project__c", FieldInput::new(name, name, FieldKind::text(10)))
                .expect("created");
        }
        registry.delete_object("Project__c").expect("deleted");
        assert!(registry.get_object("Project__c").unwrap_err().is_not_found());
        assert!(registry.list_fields("Project__c").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_unknown_object_is_not_found() {
        let mut registry = MetadataRegistry::new();
        assert!(registry.delete_object("Ghost__c").unwrap_err().is_not_found());
    }

    #[test]
    fn referenced_object_cannot_be_deleted() {
        let mut registry = MetadataRegistry::new();
        registry.create_object(ObjectInput::new("Account", "Account")).expect("account");
        project(&mut registry);
        let lookup = registry
            .create_field("Project__c", FieldInput::new("Account__c", "Account", FieldKind::lookup("Account")))
            .expect("lookup");
        let err = registry.delete_object("Account").unwrap_err();
        assert!(err.issues().iter().any(|issue| issue.code == "object.referenced"));

        registry.delete_field("Project__c", &lookup.id).expect("lookup removed");
        registry.delete_object("Account").expect("now deletable");
    }

    #[test]
    fn self_reference_does_not_block_deletion() {
        let mut registry = MetadataRegistry::new();
        project(&mut registry);
        registry
            .create_field("Project__c", FieldInput::new("Parent__c", "Parent", FieldKind::lookup("Project__c")))
            .expect("self lookup");
        registry.delete_object("Project__c").expect("deleted");
    }
}
