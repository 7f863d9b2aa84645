//! Ordered registry operations applied as one unit.
//!
//! ```text
//! [[operations]]
//! op = "create_object"
//! object = { apiName = "Project__c", label = "Project", pluralLabel = "Projects" }
//!
//! [[operations]]
//! op = "create_field"
//! object = "Project__c"
//! field = { apiName = "Status__c", label = "Status", type = "Picklist", options = ["Open", "Closed"] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    document::{self, DocumentError},
    errors::RegistryError,
    registry::{MetadataRegistry, RecordValues},
    types::{FieldInput, FieldPatch, ObjectInput, ObjectPatch},
};

#[derive(Debug, Error)]
pub enum ChangesetError {
    #[error("invalid changeset document: {0}")]
    Document(#[from] DocumentError),

    #[error("step {step} ({operation} {target}) failed: {source}")]
    Step {
        /// One-based position of the failing operation.
        step: usize,
        operation: &'static str,
        target: String,
        #[source]
        source: RegistryError,
    },
}

impl ChangesetError {
    pub fn registry_error(&self) -> Option<&RegistryError> {
        match self {
            Self::Step { source, .. } => Some(source),
            Self::Document(_) => None,
        }
    }
}

/// A single registry operation. Fields are addressed by API name because
/// their ids are only known once they have been created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Operation {
    CreateObject {
        object: ObjectInput,
    },
    UpdateObject {
        api_name: String,
        patch: ObjectPatch,
    },
    DeleteObject {
        api_name: String,
    },
    CreateField {
        object: String,
        field: FieldInput,
    },
    UpdateField {
        object: String,
        field: String,
        patch: FieldPatch,
    },
    DeleteField {
        object: String,
        field: String,
    },
    CreateRecord {
        object: String,
        #[serde(default)]
        values: RecordValues,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateObject { .. } => "create_object",
            Operation::UpdateObject { .. } => "update_object",
            Operation::DeleteObject { .. } => "delete_object",
            Operation::CreateField { .. } => "create_field",
            Operation::UpdateField { .. } => "update_field",
            Operation::DeleteField { .. } => "delete_field",
            Operation::CreateRecord { .. } => "create_record",
        }
    }

    /// The object or field the operation acts on, e.g. `Project__c.Status__c`.
    pub fn target(&self) -> String {
        match self {
            Operation::CreateObject { object } => object.api_name.clone(),
            Operation::UpdateObject { api_name, .. } | Operation::DeleteObject { api_name } => api_name.clone(),
            Operation::CreateField { object, field } => format!("{object}.{}", field.api_name),
            Operation::UpdateField { object, field, .. } | Operation::DeleteField { object, field } => {
                format!("{object}.{field}")
            }
            Operation::CreateRecord { object, .. } => object.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Changeset {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ChangesetError> {
        Ok(document::from_json_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ChangesetError> {
        Ok(document::from_toml_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ChangesetError> {
        Ok(document::load(path)?)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// What one applied operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: usize,
    pub operation: &'static str,
    pub target: String,
    /// Id of the created or updated entity, when there is one.
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesetReport {
    pub steps: Vec<StepOutcome>,
    pub committed: bool,
}

impl MetadataRegistry {
    /// Applies every operation in order. Either all of them take effect or,
    /// on the first failure, none do.
    pub fn apply(&mut self, changeset: &Changeset) -> Result<ChangesetReport, ChangesetError> {
        let mut working = self.clone();
        let mut report = working.apply_steps(changeset)?;
        report.committed = true;
        *self = working;
        log::info!("applied changeset with {} operation(s)", report.steps.len());
        Ok(report)
    }

    /// Runs the changeset against a copy of the registry and reports what
    /// would happen, leaving `self` untouched.
    pub fn preview(&self, changeset: &Changeset) -> Result<ChangesetReport, ChangesetError> {
        self.clone().apply_steps(changeset)
    }

    fn apply_steps(&mut self, changeset: &Changeset) -> Result<ChangesetReport, ChangesetError> {
        let mut report = ChangesetReport::default();
        for (index, operation) in changeset.operations.iter().enumerate() {
            let step = index + 1;
            log::debug!("step {step}: {} {}", operation.name(), operation.target());
            let id = self
                .apply_operation(operation.clone())
                .map_err(|source| ChangesetError::Step {
                    step,
                    operation: operation.name(),
                    target: operation.target(),
                    source,
                })?;
            report.steps.push(StepOutcome {
                step,
                operation: operation.name(),
                target: operation.target(),
                id,
            });
        }
        Ok(report)
    }

    fn apply_operation(&mut self, operation: Operation) -> Result<Option<String>, RegistryError> {
        let id = match operation {
            Operation::CreateObject { object } => Some(self.create_object(object)?.id),
            Operation::UpdateObject { api_name, patch } => Some(self.update_object(&api_name, patch)?.id),
            Operation::DeleteObject { api_name } => {
                self.delete_object(&api_name)?;
                None
            }
            Operation::CreateField { object, field } => Some(self.create_field(&object, field)?.id),
            Operation::UpdateField { object, field, patch } => {
                let field_id = self.get_field_by_api_name(&object, &field)?.id.clone();
                Some(self.update_field(&object, &field_id, patch)?.id)
            }
            Operation::DeleteField { object, field } => {
                let field_id = self.get_field_by_api_name(&object, &field)?.id.clone();
                self.delete_field(&object, &field_id)?;
                None
            }
            Operation::CreateRecord { object, values } => Some(self.create_record(&object, values)?.id),
        };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;

    fn project_changeset() -> Changeset {
        Changeset::new(vec![
            Operation::CreateObject {
                object: ObjectInput::new("Project__c", "Project").plural_label("Projects"),
            },
            Operation::CreateField {
                object: "Project__c".into(),
                field: FieldInput::new("Status__c", "Status", FieldKind::picklist(["Open", "Closed"])),
            },
            Operation::UpdateField {
                object: "Project__c".into(),
                field: "Status__c".into(),
                patch: FieldPatch::default().label("Stage"),
            },
        ])
    }

    #[test]
    fn applies_all_operations() {
        let mut registry = MetadataRegistry::new();
        let report = registry.apply(&project_changeset()).expect("changeset applies");
        assert!(report.committed);
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[2].target, "Project__c.Status__c");
        let field = registry
            .get_field_by_api_name("Project__c", "Status__c")
            .expect("field exists");
        assert_eq!(field.label, "Stage");
    }

    #[test]
    fn failure_rolls_back_every_step() {
        let mut registry = MetadataRegistry::new();
        let mut changeset = project_changeset();
        changeset.operations.push(Operation::DeleteObject {
            api_name: "Missing__c".into(),
        });

        let err = registry.apply(&changeset).unwrap_err();
        match &err {
            ChangesetError::Step { step, operation, .. } => {
                assert_eq!(*step, 4);
                assert_eq!(*operation, "delete_object");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.registry_error().is_some_and(RegistryError::is_not_found));
        assert!(registry.is_empty());
    }

    #[test]
    fn preview_leaves_registry_untouched() {
        let registry = MetadataRegistry::new();
        let report = registry.preview(&project_changeset()).expect("preview succeeds");
        assert!(!report.committed);
        assert_eq!(report.steps.len(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn parses_toml_operations() {
        let changeset = Changeset::from_toml_str(
            r#"
            [[operations]]
            op = "create_object"
            object = { apiName = "Project__c", label = "Project" }

            [[operations]]
            op = "create_field"
            object = "Project__c"
            field = { apiName = "Budget__c", label = "Budget", type = "Currency", precision = 10 }

            [[operations]]
            op = "update_object"
            apiName = "Project__c"
            patch = { label = "Initiative" }

            [[operations]]
            op = "create_record"
            object = "Project__c"
            values = { Budget__c = 1500.25 }
            "#,
        )
        .expect("changeset parses");
        assert_eq!(changeset.operations.len(), 4);
        assert_eq!(changeset.operations[1].target(), "Project__c.Budget__c");

        let mut registry = MetadataRegistry::new();
        registry.apply(&changeset).expect("changeset applies");
        let project = registry.get_object("Project__c").expect("project");
        assert_eq!(project.label, "Initiative");
        assert_eq!(project.record_count, 1);
    }

    #[test]
    fn patch_cannot_rename_object() {
        let parsed = Changeset::from_json_str(
            r#"{ "operations": [ { "op": "update_object", "apiName": "Project__c",
                 "patch": { "apiName": "Renamed__c" } } ] }"#,
        );
        assert!(parsed.is_err());
    }
}
