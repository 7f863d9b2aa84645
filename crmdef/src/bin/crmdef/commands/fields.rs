use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use crmdef::{Field, FieldInput, FieldKind, FieldPatch, MetadataRegistry};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::utils::{format_datetime, format_value, yes_no};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse Fields",
        commands: &[
            "crmdef fields list Account                 # Fields in creation order",
            "crmdef fields show Account Industry        # One field by API name or id",
        ],
    },
    ExampleGroup {
        title: "Change Fields",
        commands: &[
            r#"crmdef fields create Account '{"apiName":"Tier__c","label":"Tier","type":"Picklist","options":["Gold","Silver"]}'"#,
            r#"crmdef fields update Account Tier__c '{"label":"Customer Tier","required":true}'"#,
            "crmdef fields delete Account Tier__c",
        ],
    },
];

#[derive(Subcommand)]
pub enum FieldCommands {
    /// List the fields of an object
    #[command(name = "list")]
    List {
        /// Object API name
        object: String,
    },

    /// Show one field
    #[command(name = "show")]
    Show {
        /// Object API name
        object: String,

        /// Field API name or id
        field: String,
    },

    /// Create a field from a JSON definition
    #[command(name = "create")]
    Create {
        /// Object API name
        object: String,

        /// Field definition, e.g. {"apiName":"Code__c","label":"Code","type":"Text","length":20}
        definition: String,
    },

    /// Apply a JSON patch to a field
    #[command(name = "update")]
    Update {
        /// Object API name
        object: String,

        /// Field API name or id
        field: String,

        /// Patch, e.g. {"label":"New Label","helpText":"Shown on hover"}
        patch: String,
    },

    /// Delete a field and its stored values
    #[command(name = "delete")]
    Delete {
        /// Object API name
        object: String,

        /// Field API name or id
        field: String,
    },
}

pub fn handle_field_commands(
    command: FieldCommands,
    registry: &mut MetadataRegistry,
    output: &OutputManager,
) -> Result<()> {
    match command {
        FieldCommands::List { object } => {
            let fields = registry.list_fields(&object)?;
            if fields.is_empty() {
                output.info(&format!("{object} has no fields"));
                if !output.is_json() {
                    return Ok(());
                }
            }
            output.display(&FieldListView(fields.iter().collect()))
        }
        FieldCommands::Show { object, field } => {
            let field_id = resolve_field_id(registry, &object, &field)?;
            output.display(registry.get_field(&object, &field_id)?)
        }
        FieldCommands::Create { object, definition } => {
            let input: FieldInput = serde_json::from_str(&definition).context("Invalid field definition")?;
            let api_name = input.api_name.clone();
            let field = registry
                .create_field(&object, input)
                .with_context(|| format!("Failed to create field {object}.{api_name}"))?;
            output.success(&format!("Created field {object}.{} ({})", field.api_name, field.id));
            output.display(&field)
        }
        FieldCommands::Update { object, field, patch } => {
            let patch: FieldPatch = serde_json::from_str(&patch).context("Invalid field patch")?;
            let field_id = resolve_field_id(registry, &object, &field)?;
            let updated = registry
                .update_field(&object, &field_id, patch)
                .with_context(|| format!("Failed to update field {object}.{field}"))?;
            output.success(&format!("Updated field {object}.{}", updated.api_name));
            output.display(&updated)
        }
        FieldCommands::Delete { object, field } => {
            let field_id = resolve_field_id(registry, &object, &field)?;
            registry
                .delete_field(&object, &field_id)
                .with_context(|| format!("Failed to delete field {object}.{field}"))?;
            output.success(&format!("Deleted field {object}.{field}"));
            Ok(())
        }
    }
}

/// Fields are addressed by API name on the command line; ids are accepted too.
fn resolve_field_id(registry: &MetadataRegistry, object: &str, field: &str) -> Result<String> {
    if let Ok(found) = registry.get_field_by_api_name(object, field) {
        return Ok(found.id.clone());
    }
    Ok(registry.get_field(object, field)?.id.clone())
}

/// Short attribute summary, e.g. `length=80` or `options=Open,Closed`.
fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text { length } => format!("length={length}"),
        FieldKind::Number { precision, scale }
        | FieldKind::Currency { precision, scale }
        | FieldKind::Percent { precision, scale } => format!("precision={precision} scale={scale}"),
        FieldKind::Picklist { options } => format!("options={}", options.join(",")),
        FieldKind::MultiPicklist { options, visible_lines } => {
            format!("options={} lines={visible_lines}", options.join(","))
        }
        FieldKind::Lookup { reference_object } | FieldKind::MasterDetail { reference_object } => {
            format!("references={reference_object}")
        }
        FieldKind::Formula { formula, return_type } => format!("returns={return_type} formula={formula}"),
        FieldKind::LongTextArea { length, visible_lines } | FieldKind::RichText { length, visible_lines } => {
            format!("length={length} lines={visible_lines}")
        }
        FieldKind::AutoNumber {
            display_format,
            starting_number,
        } => format!("format={display_format} start={starting_number}"),
        FieldKind::Date
        | FieldKind::DateTime
        | FieldKind::Checkbox
        | FieldKind::Url
        | FieldKind::Email
        | FieldKind::Phone => String::new(),
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct FieldListView<'a>(pub Vec<&'a Field>);

impl TableDisplay for FieldListView<'_> {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(
            &mut table,
            &["API Name", "Label", "Type", "Attributes", "Required", "Unique", "Custom"],
        );
        for field in &self.0 {
            table.add_row(vec![
                Cell::new(&field.api_name),
                Cell::new(&field.label),
                Cell::new(field.field_type()),
                Cell::new(describe_kind(&field.kind)),
                Cell::new(yes_no(field.required)),
                Cell::new(yes_no(field.unique)),
                Cell::new(yes_no(field.is_custom)),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|field| format!("{}:{}", field.api_name, field.field_type()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TableDisplay for Field {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        let rows = [
            ("Id", self.id.clone()),
            ("API Name", self.api_name.clone()),
            ("Label", self.label.clone()),
            ("Type", self.field_type().to_string()),
            ("Attributes", describe_kind(&self.kind)),
            ("Required", yes_no(self.required).to_string()),
            ("Unique", yes_no(self.unique).to_string()),
            ("Default", self.default_value.as_ref().map(format_value).unwrap_or_default()),
            ("Help Text", self.help_text.clone().unwrap_or_default()),
            ("Description", self.description.clone().unwrap_or_default()),
            ("Custom", yes_no(self.is_custom).to_string()),
            ("Created", format_datetime(self.created_at)),
            ("Updated", format_datetime(self.updated_at)),
        ];
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}", self.api_name, self.field_type(), describe_kind(&self.kind))
            .trim_end()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmdef::FieldType;

    #[test]
    fn test_describe_kind() {
        assert_eq!(describe_kind(&FieldKind::text(80)), "length=80");
        assert_eq!(describe_kind(&FieldKind::picklist(["A", "B"])), "options=A,B");
        assert_eq!(describe_kind(&FieldKind::lookup("Account")), "references=Account");
        assert_eq!(describe_kind(&FieldKind::with_defaults(FieldType::Email)), "");
    }

    #[test]
    fn test_resolve_field_by_name_or_id() {
        let mut registry = MetadataRegistry::new();
        registry
            .create_object(crmdef::ObjectInput::new("Project__c", "Project"))
            .unwrap();
        let field = registry
            .create_field("Project__c", FieldInput::new("Code__c", "Code", FieldKind::text(10)))
            .unwrap();

        assert_eq!(resolve_field_id(&registry, "Project__c", "Code__c").unwrap(), field.id);
        assert_eq!(resolve_field_id(&registry, "Project__c", &field.id).unwrap(), field.id);
        assert!(resolve_field_id(&registry, "Project__c", "Missing__c").is_err());
    }
}
