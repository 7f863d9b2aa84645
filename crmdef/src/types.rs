use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enumerated field data types, named the way Setup names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Number,
    Date,
    DateTime,
    Checkbox,
    Picklist,
    MultiPicklist,
    Lookup,
    MasterDetail,
    Formula,
    LongTextArea,
    RichText,
    #[serde(rename = "URL")]
    Url,
    Email,
    Phone,
    Currency,
    Percent,
    AutoNumber,
}

impl FieldType {
    pub const ALL: [FieldType; 18] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Checkbox,
        FieldType::Picklist,
        FieldType::MultiPicklist,
        FieldType::Lookup,
        FieldType::MasterDetail,
        FieldType::Formula,
        FieldType::LongTextArea,
        FieldType::RichText,
        FieldType::Url,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Currency,
        FieldType::Percent,
        FieldType::AutoNumber,
    ];

    /// Types a formula may evaluate to.
    pub const FORMULA_RETURN_TYPES: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Percent,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Checkbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Checkbox => "Checkbox",
            FieldType::Picklist => "Picklist",
            FieldType::MultiPicklist => "MultiPicklist",
            FieldType::Lookup => "Lookup",
            FieldType::MasterDetail => "MasterDetail",
            FieldType::Formula => "Formula",
            FieldType::LongTextArea => "LongTextArea",
            FieldType::RichText => "RichText",
            FieldType::Url => "URL",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
            FieldType::Currency => "Currency",
            FieldType::Percent => "Percent",
            FieldType::AutoNumber => "AutoNumber",
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, FieldType::Lookup | FieldType::MasterDetail)
    }

    /// Computed types whose values are never written by callers.
    pub fn is_read_only(&self) -> bool {
        matches!(self, FieldType::Formula | FieldType::AutoNumber)
    }

    pub fn supports_unique(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Number
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Url
                | FieldType::Currency
                | FieldType::Percent
                | FieldType::Date
                | FieldType::DateTime
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type '{s}'"))
    }
}

pub const DEFAULT_TEXT_LENGTH: u32 = 255;
pub const MAX_TEXT_LENGTH: u32 = 255;
pub const DEFAULT_LONG_TEXT_LENGTH: u32 = 32_768;
pub const MAX_LONG_TEXT_LENGTH: u32 = 131_072;
pub const MAX_NUMERIC_PRECISION: u8 = 18;
pub const DEFAULT_AUTO_NUMBER_FORMAT: &str = "A-{0000}";
/// Largest number an AutoNumber field hands out.
pub const MAX_AUTO_NUMBER: u64 = 999_999_999_999_999;

fn default_text_length() -> u32 {
    DEFAULT_TEXT_LENGTH
}

fn default_long_text_length() -> u32 {
    DEFAULT_LONG_TEXT_LENGTH
}

fn default_precision() -> u8 {
    MAX_NUMERIC_PRECISION
}

fn default_money_scale() -> u8 {
    2
}

fn default_visible_lines() -> u8 {
    3
}

fn default_multi_visible_lines() -> u8 {
    4
}

fn default_auto_number_format() -> String {
    DEFAULT_AUTO_NUMBER_FORMAT.to_string()
}

fn default_starting_number() -> u64 {
    1
}

/// A field's data type together with the attributes that only make sense for it.
///
/// Serialized inline with the owning field, tagged by `type`:
///
/// ```text
/// { "apiName": "Status__c", "type": "Picklist", "options": ["Open", "Closed"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum FieldKind {
    Text {
        #[serde(default = "default_text_length")]
        length: u32,
    },
    Number {
        #[serde(default = "default_precision")]
        precision: u8,
        #[serde(default)]
        scale: u8,
    },
    Date,
    DateTime,
    Checkbox,
    Picklist {
        #[serde(default)]
        options: Vec<String>,
    },
    MultiPicklist {
        #[serde(default)]
        options: Vec<String>,
        #[serde(default = "default_multi_visible_lines")]
        visible_lines: u8,
    },
    Lookup {
        reference_object: String,
    },
    MasterDetail {
        reference_object: String,
    },
    Formula {
        formula: String,
        return_type: FieldType,
    },
    LongTextArea {
        #[serde(default = "default_long_text_length")]
        length: u32,
        #[serde(default = "default_visible_lines")]
        visible_lines: u8,
    },
    RichText {
        #[serde(default = "default_long_text_length")]
        length: u32,
        #[serde(default = "default_visible_lines")]
        visible_lines: u8,
    },
    #[serde(rename = "URL")]
    Url,
    Email,
    Phone,
    Currency {
        #[serde(default = "default_precision")]
        precision: u8,
        #[serde(default = "default_money_scale")]
        scale: u8,
    },
    Percent {
        #[serde(default = "default_precision")]
        precision: u8,
        #[serde(default = "default_money_scale")]
        scale: u8,
    },
    AutoNumber {
        #[serde(default = "default_auto_number_format")]
        display_format: String,
        #[serde(default = "default_starting_number")]
        starting_number: u64,
    },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text { .. } => FieldType::Text,
            FieldKind::Number { .. } => FieldType::Number,
            FieldKind::Date => FieldType::Date,
            FieldKind::DateTime => FieldType::DateTime,
            FieldKind::Checkbox => FieldType::Checkbox,
            FieldKind::Picklist { .. } => FieldType::Picklist,
            FieldKind::MultiPicklist { .. } => FieldType::MultiPicklist,
            FieldKind::Lookup { .. } => FieldType::Lookup,
            FieldKind::MasterDetail { .. } => FieldType::MasterDetail,
            FieldKind::Formula { .. } => FieldType::Formula,
            FieldKind::LongTextArea { .. } => FieldType::LongTextArea,
            FieldKind::RichText { .. } => FieldType::RichText,
            FieldKind::Url => FieldType::Url,
            FieldKind::Email => FieldType::Email,
            FieldKind::Phone => FieldType::Phone,
            FieldKind::Currency { .. } => FieldType::Currency,
            FieldKind::Percent { .. } => FieldType::Percent,
            FieldKind::AutoNumber { .. } => FieldType::AutoNumber,
        }
    }

    /// The kind for `field_type` with every attribute at its default.
    ///
    /// Picklists start without options and relationships without a target, so
    /// the result still has to pass attribute validation before it can be saved.
    pub fn with_defaults(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => FieldKind::Text {
                length: default_text_length(),
            },
            FieldType::Number => FieldKind::Number {
                precision: default_precision(),
                scale: 0,
            },
            FieldType::Date => FieldKind::Date,
            FieldType::DateTime => FieldKind::DateTime,
            FieldType::Checkbox => FieldKind::Checkbox,
            FieldType::Picklist => FieldKind::Picklist { options: Vec::new() },
            FieldType::MultiPicklist => FieldKind::MultiPicklist {
                options: Vec::new(),
                visible_lines: default_multi_visible_lines(),
            },
            FieldType::Lookup => FieldKind::Lookup {
                reference_object: String::new(),
            },
            FieldType::MasterDetail => FieldKind::MasterDetail {
                reference_object: String::new(),
            },
            FieldType::Formula => FieldKind::Formula {
                formula: String::new(),
                return_type: FieldType::Text,
            },
            FieldType::LongTextArea => FieldKind::LongTextArea {
                length: default_long_text_length(),
                visible_lines: default_visible_lines(),
            },
            FieldType::RichText => FieldKind::RichText {
                length: default_long_text_length(),
                visible_lines: default_visible_lines(),
            },
            FieldType::Url => FieldKind::Url,
            FieldType::Email => FieldKind::Email,
            FieldType::Phone => FieldKind::Phone,
            FieldType::Currency => FieldKind::Currency {
                precision: default_precision(),
                scale: default_money_scale(),
            },
            FieldType::Percent => FieldKind::Percent {
                precision: default_precision(),
                scale: default_money_scale(),
            },
            FieldType::AutoNumber => FieldKind::AutoNumber {
                display_format: default_auto_number_format(),
                starting_number: default_starting_number(),
            },
        }
    }

    pub fn text(length: u32) -> Self {
        FieldKind::Text { length }
    }

    pub fn number(precision: u8, scale: u8) -> Self {
        FieldKind::Number { precision, scale }
    }

    pub fn currency(precision: u8, scale: u8) -> Self {
        FieldKind::Currency { precision, scale }
    }

    pub fn picklist<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Picklist {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lookup(reference_object: impl Into<String>) -> Self {
        FieldKind::Lookup {
            reference_object: reference_object.into(),
        }
    }

    pub fn master_detail(reference_object: impl Into<String>) -> Self {
        FieldKind::MasterDetail {
            reference_object: reference_object.into(),
        }
    }

    pub fn formula(formula: impl Into<String>, return_type: FieldType) -> Self {
        FieldKind::Formula {
            formula: formula.into(),
            return_type,
        }
    }

    /// Target object of a Lookup or MasterDetail field.
    pub fn reference_object(&self) -> Option<&str> {
        match self {
            FieldKind::Lookup { reference_object } | FieldKind::MasterDetail { reference_object } => {
                Some(reference_object)
            }
            _ => None,
        }
    }

    /// Allowed values of a Picklist or MultiPicklist field.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Picklist { options } | FieldKind::MultiPicklist { options, .. } => Some(options),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A field definition owned by a [`MetadataObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub api_name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub help_text: Option<String>,
    pub description: Option<String>,
    pub is_custom: bool,
    pub default_value: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }
}

/// An object definition (standard or custom) and its ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataObject {
    pub id: String,
    pub api_name: String,
    pub label: String,
    pub plural_label: String,
    pub description: Option<String>,
    pub is_custom: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<Field>,
    /// Advisory count of stored records.
    pub record_count: u64,
}

impl MetadataObject {
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    pub fn field_by_api_name(&self, api_name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.api_name == api_name)
    }
}

/// Input for creating an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInput {
    pub api_name: String,
    pub label: String,
    /// Falls back to the label when omitted.
    #[serde(default)]
    pub plural_label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_custom: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ObjectInput {
    pub fn new(api_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            label: label.into(),
            plural_label: None,
            description: None,
            is_custom: true,
            is_active: true,
        }
    }

    pub fn plural_label(mut self, plural_label: impl Into<String>) -> Self {
        self.plural_label = Some(plural_label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn standard(mut self) -> Self {
        self.is_custom = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial update of an object. The API name is not part of the patch: objects cannot be renamed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub plural_label: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ObjectPatch {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn plural_label(mut self, plural_label: impl Into<String>) -> Self {
        self.plural_label = Some(plural_label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Input for creating a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    pub api_name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_custom: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl FieldInput {
    pub fn new(api_name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            api_name: api_name.into(),
            label: label.into(),
            kind,
            required: false,
            unique: false,
            help_text: None,
            description: None,
            is_custom: true,
            default_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn standard(mut self) -> Self {
        self.is_custom = false;
        self
    }
}

/// Partial update of a field. Unset members keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub unique: Option<bool>,
    /// An empty string clears the help text.
    #[serde(default)]
    pub help_text: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub clear_default_value: bool,
    /// Replacement attributes; must keep the field's current type.
    #[serde(default)]
    pub attributes: Option<FieldKind>,
}

impl FieldPatch {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn clear_default_value(mut self) -> Self {
        self.clear_default_value = true;
        self
    }

    pub fn attributes(mut self, kind: FieldKind) -> Self {
        self.attributes = Some(kind);
        self
    }
}
