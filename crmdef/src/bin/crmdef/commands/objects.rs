use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use crmdef::{MetadataObject, MetadataRegistry, ObjectInput, ObjectPatch, Relationship, RelationshipDirection};
use serde::Serialize;

use crate::commands::fields::FieldListView;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme::ICONS;
use crate::utils::{format_datetime, yes_no};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse Objects",
        commands: &[
            "crmdef objects list                  # All objects in creation order",
            "crmdef objects list --custom         # Only custom objects",
            "crmdef objects show Account          # Object details and its fields",
            "crmdef relationships Contact         # Lookups to and from Contact",
        ],
    },
    ExampleGroup {
        title: "Change Objects",
        commands: &[
            "crmdef objects create Project__c --label Project --plural-label Projects",
            "crmdef objects update Project__c --label Initiative",
            "crmdef objects delete Project__c",
        ],
    },
];

#[derive(Subcommand)]
pub enum ObjectCommands {
    /// List objects
    #[command(name = "list")]
    List {
        /// Only show custom objects
        #[arg(long)]
        custom: bool,
    },

    /// Show one object with its fields
    #[command(name = "show")]
    Show {
        /// Object API name
        api_name: String,
    },

    /// Create an object
    #[command(name = "create")]
    Create {
        /// Object API name
        api_name: String,

        #[arg(long)]
        label: String,

        /// Defaults to the label
        #[arg(long)]
        plural_label: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Change labels, description or active state of an object
    #[command(name = "update")]
    Update {
        /// Object API name
        api_name: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        plural_label: Option<String>,

        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete an object together with its fields and records
    #[command(name = "delete")]
    Delete {
        /// Object API name
        api_name: String,
    },
}

pub fn handle_object_commands(
    command: ObjectCommands,
    registry: &mut MetadataRegistry,
    output: &OutputManager,
) -> Result<()> {
    match command {
        ObjectCommands::List { custom } => {
            let objects = ObjectListView(
                registry
                    .list_objects()
                    .into_iter()
                    .filter(|object| !custom || object.is_custom)
                    .collect(),
            );
            output.display(&objects)
        }
        ObjectCommands::Show { api_name } => handle_show(registry, &api_name, output),
        ObjectCommands::Create {
            api_name,
            label,
            plural_label,
            description,
        } => {
            let mut input = ObjectInput::new(&api_name, label);
            if let Some(plural_label) = plural_label {
                input = input.plural_label(plural_label);
            }
            if let Some(description) = description {
                input = input.description(description);
            }
            let object = registry
                .create_object(input)
                .with_context(|| format!("Failed to create object {api_name}"))?;
            output.success(&format!("Created object {} ({})", object.api_name, object.id));
            output.display(&object)
        }
        ObjectCommands::Update {
            api_name,
            label,
            plural_label,
            description,
            active,
        } => {
            let patch = ObjectPatch {
                label,
                plural_label,
                description,
                is_active: active,
            };
            let object = registry
                .update_object(&api_name, patch)
                .with_context(|| format!("Failed to update object {api_name}"))?;
            output.success(&format!("Updated object {}", object.api_name));
            output.display(&object)
        }
        ObjectCommands::Delete { api_name } => {
            registry
                .delete_object(&api_name)
                .with_context(|| format!("Failed to delete object {api_name}"))?;
            output.success(&format!("Deleted object {api_name}"));
            Ok(())
        }
    }
}

fn handle_show(registry: &MetadataRegistry, api_name: &str, output: &OutputManager) -> Result<()> {
    let object = registry.get_object(api_name)?;
    if output.is_json() {
        return output.display(object);
    }

    output.heading(&format!("{} ({})", object.label, object.api_name));
    output.display(object)?;

    output.heading("Fields");
    if object.fields.is_empty() {
        output.info("No fields defined");
        return Ok(());
    }
    output.display(&FieldListView(object.fields.iter().collect()))
}

pub fn handle_relationships(registry: &MetadataRegistry, api_name: &str, output: &OutputManager) -> Result<()> {
    let relationships = registry.relationships(api_name)?;
    if relationships.is_empty() {
        output.info(&format!("{api_name} has no relationships"));
        if !output.is_json() {
            return Ok(());
        }
    }
    output.display(&RelationshipListView(relationships))
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct ObjectListView<'a>(pub Vec<&'a MetadataObject>);

impl TableDisplay for ObjectListView<'_> {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(
            &mut table,
            &["API Name", "Label", "Plural Label", "Custom", "Active", "Fields", "Records"],
        );
        for object in &self.0 {
            table.add_row(vec![
                Cell::new(&object.api_name),
                Cell::new(&object.label),
                Cell::new(&object.plural_label),
                Cell::new(yes_no(object.is_custom)),
                Cell::new(yes_no(object.is_active)),
                Cell::new(object.fields.len()),
                Cell::new(object.record_count),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|object| object.api_name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TableDisplay for MetadataObject {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        let description = self.description.clone().unwrap_or_default();
        let rows = [
            ("Id", self.id.clone()),
            ("API Name", self.api_name.clone()),
            ("Label", self.label.clone()),
            ("Plural Label", self.plural_label.clone()),
            ("Description", description),
            ("Custom", yes_no(self.is_custom).to_string()),
            ("Active", yes_no(self.is_active).to_string()),
            ("Records", self.record_count.to_string()),
            ("Created", format_datetime(self.created_at)),
            ("Updated", format_datetime(self.updated_at)),
        ];
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} label={} fields={} records={}",
            self.api_name,
            self.label,
            self.fields.len(),
            self.record_count
        )
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct RelationshipListView(pub Vec<Relationship>);

impl TableDisplay for RelationshipListView {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Direction", "Type", "Child", "Field", "Parent"]);
        for relationship in &self.0 {
            let direction = match relationship.direction {
                RelationshipDirection::Outgoing => format!("{} outgoing", ICONS.outgoing),
                RelationshipDirection::Incoming => format!("{} incoming", ICONS.incoming),
            };
            table.add_row(vec![
                Cell::new(direction),
                Cell::new(relationship.kind),
                Cell::new(&relationship.child_object),
                Cell::new(&relationship.field_api_name),
                Cell::new(&relationship.parent_object),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|r| format!("{}.{}->{}", r.child_object, r.field_api_name, r.parent_object))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GlobalOptions;
    use crmdef::{FieldInput, FieldKind};

    #[test]
    fn test_relationship_table_marks_direction() {
        let mut registry = MetadataRegistry::new();
        registry.create_object(ObjectInput::new("Account", "Account")).expect("account");
        registry.create_object(ObjectInput::new("Contact", "Contact")).expect("contact");
        registry
            .create_field("Contact", FieldInput::new("AccountId", "Account", FieldKind::lookup("Account")))
            .expect("lookup");
        let output = OutputManager::new(GlobalOptions {
            no_color: true,
            ..Default::default()
        });

        let incoming = RelationshipListView(registry.relationships("Account").expect("account"));
        let rendered = incoming.to_table(&output).to_string();
        assert!(rendered.contains(&format!("{} incoming", ICONS.incoming)));

        let outgoing = RelationshipListView(registry.relationships("Contact").expect("contact"));
        assert!(outgoing.to_table(&output).to_string().contains(&format!("{} outgoing", ICONS.outgoing)));
        assert_eq!(outgoing.to_compact(), "Contact.AccountId->Account");
    }
}
