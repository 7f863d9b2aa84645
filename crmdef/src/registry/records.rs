use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MetadataRegistry;
use crate::{
    errors::{EntityKind, RegistryError, RegistryResult, ValidationError, ValidationIssue},
    id,
    types::{Field, FieldKind, FieldType, MAX_AUTO_NUMBER, MetadataObject},
    validators::{AUTO_NUMBER_PLACEHOLDER, validate_field_value},
};

/// Record values keyed by field API name.
pub type RecordValues = BTreeMap<String, Value>;

/// A data record stored against an object definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub object_api_name: String,
    pub values: RecordValues,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn get(&self, field_api_name: &str) -> Option<&Value> {
        self.values.get(field_api_name)
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct RecordStore {
    by_object: HashMap<String, IndexMap<String, Record>>,
    /// Last number handed out per AutoNumber field id.
    auto_numbers: HashMap<String, u64>,
}

impl RecordStore {
    fn records(&self, object_api_name: &str) -> impl Iterator<Item = &Record> {
        self.by_object
            .get(object_api_name)
            .into_iter()
            .flat_map(|records| records.values())
    }

    fn count(&self, object_api_name: &str) -> u64 {
        self.by_object
            .get(object_api_name)
            .map_or(0, |records| records.len() as u64)
    }

    fn contains(&self, object_api_name: &str, record_id: &str) -> bool {
        self.by_object
            .get(object_api_name)
            .is_some_and(|records| records.contains_key(record_id))
    }

    pub(super) fn drop_object(&mut self, object: &MetadataObject) {
        self.by_object.remove(&object.api_name);
        for field in &object.fields {
            self.auto_numbers.remove(&field.id);
        }
    }

    pub(super) fn drop_field(&mut self, object_api_name: &str, field: &Field) {
        if let Some(records) = self.by_object.get_mut(object_api_name) {
            for record in records.values_mut() {
                record.values.remove(&field.api_name);
            }
        }
        self.auto_numbers.remove(&field.id);
    }

    /// Issues that would arise if `field` were applied to the records already stored for the object.
    pub(super) fn compatibility_issues(&self, object_api_name: &str, field: &Field) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if field.field_type().is_read_only() {
            return issues;
        }

        let mut invalid = 0usize;
        let mut dangling = 0usize;
        let mut missing = 0usize;
        let mut seen = HashSet::new();
        let mut duplicated = false;
        for record in self.records(object_api_name) {
            match record.get(&field.api_name) {
                Some(value) => {
                    if !validate_field_value(&field.api_name, &field.kind, value).is_empty() {
                        invalid += 1;
                    } else if let Some(reference) = field.kind.reference_object()
                        && let Some(target_id) = value.as_str()
                        && !self.contains(reference, target_id)
                    {
                        dangling += 1;
                    }
                    if field.unique && !seen.insert(unique_key(value)) {
                        duplicated = true;
                    }
                }
                None if field.required => missing += 1,
                None => {}
            }
        }

        if invalid > 0 {
            issues.push(ValidationIssue::new(
                field.api_name.as_str(),
                "field.records_incompatible",
                format!("{invalid} existing record(s) hold values the new definition rejects"),
            ));
        }
        if dangling > 0 {
            issues.push(ValidationIssue::new(
                field.api_name.as_str(),
                "field.records_dangling",
                format!(
                    "{dangling} existing record(s) reference ids that are not {} records",
                    field.kind.reference_object().unwrap_or_default()
                ),
            ));
        }
        if missing > 0 {
            issues.push(ValidationIssue::new(
                field.api_name.as_str(),
                "field.required_existing_records",
                format!("{missing} existing record(s) have no value for this required field"),
            ));
        }
        if duplicated {
            issues.push(ValidationIssue::new(
                field.api_name.as_str(),
                "field.records_not_unique",
                "existing records hold duplicate values",
            ));
        }
        issues
    }
}

/// Comparison key for unique fields; text compares case-insensitively and
/// never equals a non-text value with the same rendering.
fn unique_key(value: &Value) -> String {
    match value {
        Value::String(text) => format!("s:{}", text.to_lowercase()),
        other => format!("v:{other}"),
    }
}

fn format_auto_number(display_format: &str, number: u64) -> String {
    AUTO_NUMBER_PLACEHOLDER
        .replace(display_format, |captures: &regex::Captures<'_>| {
            let width = captures[1].len();
            format!("{number:0width$}")
        })
        .into_owned()
}

impl MetadataRegistry {
    pub fn list_records(&self, object_api_name: &str) -> RegistryResult<Vec<&Record>> {
        self.get_object(object_api_name)?;
        Ok(self.records.records(object_api_name).collect())
    }

    pub fn get_record(&self, object_api_name: &str, record_id: &str) -> RegistryResult<&Record> {
        self.get_object(object_api_name)?;
        self.records
            .by_object
            .get(object_api_name)
            .and_then(|records| records.get(record_id))
            .ok_or_else(|| RegistryError::not_found(EntityKind::Record, record_id))
    }

    /// Stores a new record after checking `values` against the object's fields.
    ///
    /// Missing values fall back to field defaults and AutoNumber fields are
    /// numbered once every check has passed.
    pub fn create_record(&mut self, object_api_name: &str, values: RecordValues) -> RegistryResult<Record> {
        let object = self.get_object(object_api_name)?;
        let mut merged = self.checked_values(object, None, values)?;

        let mut assigned = Vec::new();
        for field in &object.fields {
            if let FieldKind::AutoNumber {
                display_format,
                starting_number,
            } = &field.kind
            {
                let next = match self.records.auto_numbers.get(&field.id) {
                    None => Some(*starting_number),
                    Some(last) => last.checked_add(1).filter(|next| *next <= MAX_AUTO_NUMBER),
                };
                let Some(next) = next else {
                    return Err(ValidationError::single(
                        field.api_name.as_str(),
                        "value.auto_number_exhausted",
                        format!("{} has no numbers left to assign", field.label),
                    )
                    .into());
                };
                merged.insert(field.api_name.clone(), Value::String(format_auto_number(display_format, next)));
                assigned.push((field.id.clone(), next));
            }
        }
        self.records.auto_numbers.extend(assigned);

        let now = self.now();
        let record = Record {
            id: id::generate_record_id(),
            object_api_name: object_api_name.to_string(),
            values: merged,
            created_at: now,
            updated_at: now,
        };
        self.records
            .by_object
            .entry(object_api_name.to_string())
            .or_default()
            .insert(record.id.clone(), record.clone());
        self.sync_record_count(object_api_name);
        Ok(record)
    }

    /// Merges `values` into an existing record. A `null` value clears the field.
    pub fn update_record(
        &mut self,
        object_api_name: &str,
        record_id: &str,
        values: RecordValues,
    ) -> RegistryResult<Record> {
        let existing = self.get_record(object_api_name, record_id)?;
        let object = self.get_object(object_api_name)?;
        let merged = self.checked_values(object, Some(existing), values)?;

        let now = self.now();
        let record = self
            .records
            .by_object
            .get_mut(object_api_name)
            .and_then(|records| records.get_mut(record_id))
            .ok_or_else(|| RegistryError::not_found(EntityKind::Record, record_id))?;
        record.values = merged;
        record.updated_at = now;
        Ok(record.clone())
    }

    /// Deletes a record and everything that depends on it.
    ///
    /// MasterDetail children are deleted with their parent; Lookup values that
    /// pointed at a deleted record are cleared. A required Lookup on a surviving
    /// record blocks the whole delete with `record.referenced`. Returns the ids
    /// of every record removed, starting with `record_id`.
    pub fn delete_record(&mut self, object_api_name: &str, record_id: &str) -> RegistryResult<Vec<String>> {
        self.get_record(object_api_name, record_id)?;

        let dependents: Vec<(String, Field)> = self
            .objects
            .values()
            .flat_map(|candidate| {
                candidate
                    .fields
                    .iter()
                    .filter(|field| field.kind.reference_object().is_some())
                    .map(|field| (candidate.api_name.clone(), field.clone()))
            })
            .collect();

        // Collect the full master-detail cascade before touching anything.
        let mut doomed: IndexSet<(String, String)> = IndexSet::new();
        let mut pending = vec![(object_api_name.to_string(), record_id.to_string())];
        while let Some(key) = pending.pop() {
            if !doomed.insert(key.clone()) {
                continue;
            }
            let (object, id) = key;
            for (child_object, field) in &dependents {
                if field.field_type() != FieldType::MasterDetail
                    || field.kind.reference_object() != Some(object.as_str())
                {
                    continue;
                }
                for child in self.records.records(child_object) {
                    if child.get(&field.api_name).and_then(Value::as_str) == Some(id.as_str()) {
                        pending.push((child_object.clone(), child.id.clone()));
                    }
                }
            }
        }

        let points_at_doomed = |field: &Field, record: &Record| {
            field.kind.reference_object().is_some_and(|target| {
                record
                    .get(&field.api_name)
                    .and_then(Value::as_str)
                    .is_some_and(|id| doomed.contains(&(target.to_string(), id.to_string())))
            })
        };

        let mut issues = Vec::new();
        for (child_object, field) in &dependents {
            if field.field_type() == FieldType::MasterDetail || !field.required {
                continue;
            }
            let blocking = self
                .records
                .records(child_object)
                .filter(|child| !doomed.contains(&(child_object.clone(), child.id.clone())))
                .filter(|child| points_at_doomed(field, *child))
                .count();
            if blocking > 0 {
                issues.push(ValidationIssue::new(
                    field.api_name.as_str(),
                    "record.referenced",
                    format!("{blocking} {child_object} record(s) require this reference"),
                ));
            }
        }
        ValidationError::into_result(issues)?;

        let mut touched_objects = HashSet::new();
        for (object, id) in &doomed {
            if let Some(records) = self.records.by_object.get_mut(object) {
                records.shift_remove(id);
            }
            touched_objects.insert(object.clone());
        }
        for (child_object, field) in &dependents {
            let Some(children) = self.records.by_object.get_mut(child_object) else {
                continue;
            };
            for child in children.values_mut() {
                if points_at_doomed(field, &*child) {
                    child.values.remove(&field.api_name);
                }
            }
        }

        for object in touched_objects {
            self.sync_record_count(&object);
        }
        Ok(doomed.into_iter().map(|(_, id)| id).collect())
    }

    fn sync_record_count(&mut self, object_api_name: &str) {
        let count = self.records.count(object_api_name);
        if let Some(object) = self.objects.get_mut(object_api_name) {
            object.record_count = count;
        }
    }

    /// Validates a write and returns the record values to store.
    fn checked_values(
        &self,
        object: &MetadataObject,
        existing: Option<&Record>,
        values: RecordValues,
    ) -> RegistryResult<RecordValues> {
        let mut issues = Vec::new();
        let mut merged = existing.map(|record| record.values.clone()).unwrap_or_default();

        for (name, value) in &values {
            let Some(field) = object.field_by_api_name(name) else {
                issues.push(ValidationIssue::new(
                    name.as_str(),
                    "record.unknown_field",
                    format!("{} has no field '{name}'", object.api_name),
                ));
                continue;
            };
            if field.field_type().is_read_only() {
                issues.push(ValidationIssue::new(
                    name.as_str(),
                    "value.read_only",
                    format!("{} fields are read-only", field.field_type()),
                ));
                continue;
            }
            issues.extend(validate_field_value(name, &field.kind, value));
            if let Some(reference) = field.kind.reference_object()
                && let Some(target_id) = value.as_str()
                && !target_id.trim().is_empty()
                && !self.records.contains(reference, target_id)
            {
                issues.push(ValidationIssue::new(
                    name.as_str(),
                    "value.reference",
                    format!("no {reference} record with id '{target_id}'"),
                ));
            }
        }

        for (name, value) in values {
            if value.is_null() {
                merged.remove(&name);
            } else {
                merged.insert(name, value);
            }
        }

        if existing.is_none() {
            for field in &object.fields {
                if let Some(default) = &field.default_value
                    && !merged.contains_key(&field.api_name)
                {
                    merged.insert(field.api_name.clone(), default.clone());
                }
            }
        }

        for field in &object.fields {
            if field.field_type().is_read_only() {
                continue;
            }
            let value = merged.get(&field.api_name);
            if field.required && value.is_none() {
                issues.push(ValidationIssue::new(
                    field.api_name.as_str(),
                    "value.required",
                    format!("{} is required", field.label),
                ));
            }
            if field.unique
                && let Some(value) = value
            {
                let key = unique_key(value);
                let clash = self
                    .records
                    .records(&object.api_name)
                    .filter(|other| existing.is_none_or(|current| current.id != other.id))
                    .any(|other| other.get(&field.api_name).is_some_and(|v| unique_key(v) == key));
                if clash {
                    issues.push(ValidationIssue::new(
                        field.api_name.as_str(),
                        "value.unique",
                        format!("another {} record already uses this {}", object.label, field.label),
                    ));
                }
            }
        }

        ValidationError::into_result(issues)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_number_pads_to_placeholder_width() {
        assert_eq!(format_auto_number("A-{0000}", 7), "A-0007");
        assert_eq!(format_auto_number("INV{00}-X", 12345), "INV12345-X");
    }

    #[test]
    fn unique_key_ignores_text_case() {
        assert_eq!(unique_key(&Value::from("ACME")), unique_key(&Value::from("acme")));
        assert_ne!(unique_key(&Value::from(1)), unique_key(&Value::from("1")));
    }
}
