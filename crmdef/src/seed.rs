//! Seed data for a fresh session registry.
//!
//! A seed is a list of objects with nested fields. Built-in standard objects
//! come from [`standard_objects`]; additional seeds are read from JSON or TOML
//! documents. Seeds go through the regular create path, so they are held to
//! the same rules as any other caller.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    document::{self, DocumentError},
    errors::RegistryError,
    registry::MetadataRegistry,
    types::{FieldInput, FieldKind, FieldType, ObjectInput},
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid seed document: {0}")]
    Document(#[from] DocumentError),

    #[error("seed entry '{object}' rejected: {source}")]
    Registry {
        object: String,
        #[source]
        source: RegistryError,
    },
}

/// One object of a seed document together with its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedObject {
    #[serde(flatten)]
    pub object: ObjectInput,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

impl SeedObject {
    pub fn new(object: ObjectInput) -> Self {
        Self {
            object,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldInput) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub objects: Vec<SeedObject>,
}

impl SeedDocument {
    pub fn from_json_str(content: &str) -> Result<Self, SeedError> {
        Ok(document::from_json_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SeedError> {
        Ok(document::from_toml_str(content)?)
    }

    /// Reads a `.json` or `.toml` seed document.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        Ok(document::load(path)?)
    }

    pub fn standard() -> Self {
        Self {
            objects: standard_objects(),
        }
    }
}

/// Counts of what a seed added to the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub objects: usize,
    pub fields: usize,
}

impl MetadataRegistry {
    /// A registry pre-populated with the built-in standard objects.
    pub fn with_standard_objects() -> Result<Self, SeedError> {
        let mut registry = Self::new();
        registry.load_seed(&SeedDocument::standard())?;
        Ok(registry)
    }

    /// Applies a seed document: every object first, then every field, so
    /// relationship fields may point at objects declared later in the document.
    /// Nothing is applied if any entry is rejected.
    pub fn load_seed(&mut self, document: &SeedDocument) -> Result<SeedSummary, SeedError> {
        let mut working = self.clone();
        let mut summary = SeedSummary::default();

        for seed in &document.objects {
            working
                .create_object(seed.object.clone())
                .map_err(|source| SeedError::Registry {
                    object: seed.object.api_name.clone(),
                    source,
                })?;
            summary.objects += 1;
        }
        for seed in &document.objects {
            for field in &seed.fields {
                working
                    .create_field(&seed.object.api_name, field.clone())
                    .map_err(|source| SeedError::Registry {
                        object: format!("{}.{}", seed.object.api_name, field.api_name),
                        source,
                    })?;
                summary.fields += 1;
            }
        }

        log::debug!("seeded {} objects and {} fields", summary.objects, summary.fields);
        *self = working;
        Ok(summary)
    }
}

fn text(api_name: &str, label: &str, length: u32) -> FieldInput {
    FieldInput::new(api_name, label, FieldKind::text(length)).standard()
}

fn picklist(api_name: &str, label: &str, options: &[&str]) -> FieldInput {
    FieldInput::new(api_name, label, FieldKind::picklist(options.iter().copied())).standard()
}

fn simple(api_name: &str, label: &str, field_type: FieldType) -> FieldInput {
    FieldInput::new(api_name, label, FieldKind::with_defaults(field_type)).standard()
}

fn lookup(api_name: &str, label: &str, target: &str) -> FieldInput {
    FieldInput::new(api_name, label, FieldKind::lookup(target)).standard()
}

/// Standard CRM objects every session starts with unless configured otherwise.
pub fn standard_objects() -> Vec<SeedObject> {
    vec![account(), contact(), opportunity(), lead(), case()]
}

fn account() -> SeedObject {
    SeedObject::new(ObjectInput::new("Account", "Account").plural_label("Accounts").standard())
        .field(text("Name", "Account Name", 255).required())
        .field(text("AccountNumber", "Account Number", 40))
        .field(picklist("Type", "Type", &["Prospect", "Customer - Direct", "Customer - Channel", "Partner", "Other"]))
        .field(picklist(
            "Industry",
            "Industry",
            &["Agriculture", "Banking", "Education", "Healthcare", "Manufacturing", "Retail", "Technology"],
        ))
        .field(FieldInput::new("AnnualRevenue", "Annual Revenue", FieldKind::currency(18, 0)).standard())
        .field(simple("Phone", "Phone", FieldType::Phone))
        .field(simple("Website", "Website", FieldType::Url))
        .field(lookup("ParentId", "Parent Account", "Account"))
}

fn contact() -> SeedObject {
    SeedObject::new(ObjectInput::new("Contact", "Contact").plural_label("Contacts").standard())
        .field(text("FirstName", "First Name", 40))
        .field(text("LastName", "Last Name", 80).required())
        .field(lookup("AccountId", "Account Name", "Account"))
        .field(simple("Email", "Email", FieldType::Email))
        .field(simple("Phone", "Phone", FieldType::Phone))
        .field(simple("Birthdate", "Birthdate", FieldType::Date))
        .field(simple("HasOptedOutOfEmail", "Email Opt Out", FieldType::Checkbox).default_value(false))
}

fn opportunity() -> SeedObject {
    SeedObject::new(
        ObjectInput::new("Opportunity", "Opportunity")
            .plural_label("Opportunities")
            .standard(),
    )
    .field(text("Name", "Opportunity Name", 120).required())
    .field(lookup("AccountId", "Account Name", "Account"))
    .field(
        picklist(
            "StageName",
            "Stage",
            &["Prospecting", "Qualification", "Proposal", "Negotiation", "Closed Won", "Closed Lost"],
        )
        .required()
        .default_value("Prospecting"),
    )
    .field(FieldInput::new("Amount", "Amount", FieldKind::currency(16, 2)).standard())
    .field(simple("CloseDate", "Close Date", FieldType::Date).required())
    .field(FieldInput::new("Probability", "Probability (%)", FieldKind::Percent { precision: 3, scale: 0 }).standard())
}

fn lead() -> SeedObject {
    SeedObject::new(ObjectInput::new("Lead", "Lead").plural_label("Leads").standard())
        .field(text("FirstName", "First Name", 40))
        .field(text("LastName", "Last Name", 80).required())
        .field(text("Company", "Company", 255).required())
        .field(simple("Email", "Email", FieldType::Email))
        .field(
            picklist(
                "Status",
                "Lead Status",
                &["Open - Not Contacted", "Working - Contacted", "Closed - Converted", "Closed - Not Converted"],
            )
            .required()
            .default_value("Open - Not Contacted"),
        )
}

fn case() -> SeedObject {
    SeedObject::new(ObjectInput::new("Case", "Case").plural_label("Cases").standard())
        .field(
            FieldInput::new(
                "CaseNumber",
                "Case Number",
                FieldKind::AutoNumber {
                    display_format: "{00000000}".to_string(),
                    starting_number: 1,
                },
            )
            .standard(),
        )
        .field(text("Subject", "Subject", 255))
        .field(picklist("Status", "Status", &["New", "Working", "Escalated", "Closed"]).default_value("New"))
        .field(picklist("Priority", "Priority", &["High", "Medium", "Low"]).default_value("Medium"))
        .field(lookup("AccountId", "Account Name", "Account"))
        .field(lookup("ContactId", "Contact Name", "Contact"))
        .field(simple("Description", "Description", FieldType::LongTextArea))
}
