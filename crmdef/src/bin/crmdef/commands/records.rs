use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use crmdef::{MetadataRegistry, Record, RecordValues};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme::ICONS;
use crate::utils::{format_datetime, format_value};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Records",
    commands: &[
        r#"crmdef records create Account '{"Name":"Acme","Industry":"Retail"}'"#,
        r#"crmdef records update Account a0R... '{"Industry":null}'"#,
        "crmdef records list Account",
        "crmdef records delete Account a0R...    # Also removes master-detail children",
    ],
}];

#[derive(Subcommand)]
pub enum RecordCommands {
    /// List records of an object
    #[command(name = "list")]
    List {
        /// Object API name
        object: String,
    },

    /// Create a record from a JSON object of field values
    #[command(name = "create")]
    Create {
        /// Object API name
        object: String,

        /// Values keyed by field API name
        values: String,
    },

    /// Merge JSON values into a record; null clears a value
    #[command(name = "update")]
    Update {
        /// Object API name
        object: String,

        /// Record id
        id: String,

        /// Values keyed by field API name
        values: String,
    },

    /// Delete a record
    #[command(name = "delete")]
    Delete {
        /// Object API name
        object: String,

        /// Record id
        id: String,
    },
}

pub fn handle_record_commands(
    command: RecordCommands,
    registry: &mut MetadataRegistry,
    output: &OutputManager,
) -> Result<()> {
    match command {
        RecordCommands::List { object } => {
            let columns = registry
                .list_fields(&object)?
                .iter()
                .map(|field| field.api_name.clone())
                .collect();
            let records = registry.list_records(&object)?;
            output.display(&RecordListView { columns, records })
        }
        RecordCommands::Create { object, values } => {
            let values: RecordValues = serde_json::from_str(&values).context("Invalid record values")?;
            let record = registry
                .create_record(&object, values)
                .with_context(|| format!("Failed to create {object} record"))?;
            output.success(&format!("Created {object} record {}", record.id));
            output.display(&record)
        }
        RecordCommands::Update { object, id, values } => {
            let values: RecordValues = serde_json::from_str(&values).context("Invalid record values")?;
            let record = registry
                .update_record(&object, &id, values)
                .with_context(|| format!("Failed to update {object} record {id}"))?;
            output.success(&format!("Updated {object} record {}", record.id));
            output.display(&record)
        }
        RecordCommands::Delete { object, id } => {
            let removed = registry
                .delete_record(&object, &id)
                .with_context(|| format!("Failed to delete {object} record {id}"))?;
            output.success(&format!("Deleted {} record(s)", removed.len()));
            for removed_id in removed.iter().filter(|removed_id| **removed_id != id) {
                output.indented(ICONS.cascade, &format!("cascaded to {removed_id}"));
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
pub struct RecordListView<'a> {
    #[serde(skip)]
    pub columns: Vec<String>,
    pub records: Vec<&'a Record>,
}

impl TableDisplay for RecordListView<'_> {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        let mut headers = vec!["Id"];
        headers.extend(self.columns.iter().map(String::as_str));
        output.add_table_header(&mut table, &headers);
        for record in &self.records {
            let mut row = vec![Cell::new(&record.id)];
            row.extend(
                self.columns
                    .iter()
                    .map(|column| Cell::new(record.get(column).map(format_value).unwrap_or_default())),
            );
            table.add_row(row);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("{} record(s)", self.records.len())
    }
}

impl TableDisplay for Record {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Field", "Value"]);
        table.add_row(vec![Cell::new("Id"), Cell::new(&self.id)]);
        table.add_row(vec![Cell::new("Object"), Cell::new(&self.object_api_name)]);
        for (field, value) in &self.values {
            table.add_row(vec![Cell::new(field), Cell::new(format_value(value))]);
        }
        table.add_row(vec![Cell::new("Created"), Cell::new(format_datetime(self.created_at))]);
        table.add_row(vec![Cell::new("Updated"), Cell::new(format_datetime(self.updated_at))]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {} value(s)", self.id, self.values.len())
    }
}
