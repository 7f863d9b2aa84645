use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use crmdef::{
    FieldInput, ValidationIssue,
    validators::{validate_api_name, validate_default_value, validate_field_type_attributes, validate_required_label},
};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Validation",
    commands: &[
        "crmdef validate api-name Project__c",
        r#"crmdef validate field '{"apiName":"Stage__c","label":"Stage","type":"Picklist","options":[]}'"#,
    ],
}];

#[derive(Subcommand)]
pub enum ValidateCommands {
    /// Check that a name can be used as an object or field API name
    #[command(name = "api-name")]
    ApiName {
        name: String,
    },

    /// Check a JSON field definition on its own, without an object
    #[command(name = "field")]
    Field {
        definition: String,
    },
}

pub fn handle_validate_commands(command: ValidateCommands, output: &OutputManager) -> Result<()> {
    let (subject, report) = match command {
        ValidateCommands::ApiName { name } => {
            let issues = validate_api_name(&name).err().map(|err| err.issues).unwrap_or_default();
            (name, ValidationReport::from_issues(issues))
        }
        ValidateCommands::Field { definition } => {
            let input: FieldInput = serde_json::from_str(&definition).context("Invalid field definition")?;
            let subject = input.api_name.clone();
            (subject, ValidationReport::from_issues(field_definition_issues(&input)))
        }
    };

    if report.valid {
        output.success(&format!("{subject} is valid"));
        if output.is_json() {
            output.display(&report)?;
        }
        return Ok(());
    }

    output.display(&report)?;
    anyhow::bail!("{subject} is not valid")
}

fn field_definition_issues(input: &FieldInput) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let checks = [
        validate_api_name(&input.api_name),
        validate_required_label(&input.label),
        validate_field_type_attributes(&input.kind),
    ];
    for check in checks {
        if let Err(err) = check {
            issues.extend(err.issues);
        }
    }
    if let Some(default) = &input.default_value
        && let Err(err) = validate_default_value(&input.kind, default)
    {
        issues.extend(err.issues);
    }
    issues
}

#[derive(Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

impl TableDisplay for ValidationReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Field", "Code", "Message"]);
        for issue in &self.issues {
            table.add_row(vec![
                Cell::new(&issue.field),
                Cell::new(&issue.code),
                Cell::new(&issue.message),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.issues
            .iter()
            .map(|issue| format!("{}:{}", issue.field, issue.code))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
