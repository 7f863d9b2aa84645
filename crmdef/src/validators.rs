//! Pure validation helpers shared by the registry and its callers.
//!
//! Callers run these before invoking a mutation to surface problems early; the
//! registry runs them again itself, so skipping them never corrupts state.

use chrono::{DateTime, NaiveDate};
use email_address::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::{
    errors::{ValidationError, ValidationIssue, ValidationResult},
    types::{FieldKind, FieldType, MAX_AUTO_NUMBER, MAX_LONG_TEXT_LENGTH, MAX_NUMERIC_PRECISION, MAX_TEXT_LENGTH},
};

pub const API_NAME_MESSAGE: &str = "must start with letter/underscore and contain only letters, numbers, underscores";
pub const LABEL_REQUIRED_MESSAGE: &str = "Label is required";
pub const PICKLIST_OPTIONS_MESSAGE: &str = "Picklist requires at least one option";

const MAX_PHONE_LENGTH: usize = 40;
const MAX_VISIBLE_LINES: u8 = 50;

static API_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("api name pattern compiles"));

pub(crate) static AUTO_NUMBER_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(0+)\}").expect("auto number placeholder pattern compiles"));

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

pub fn is_valid_api_name(name: &str) -> bool {
    API_NAME_PATTERN.is_match(name)
}

pub fn validate_api_name(name: &str) -> ValidationResult<()> {
    if is_valid_api_name(name) {
        Ok(())
    } else {
        Err(ValidationError::single("apiName", "api_name.syntax", API_NAME_MESSAGE))
    }
}

pub fn validate_required_label(label: &str) -> ValidationResult<()> {
    if label.trim().is_empty() {
        Err(ValidationError::single("label", "label.required", LABEL_REQUIRED_MESSAGE))
    } else {
        Ok(())
    }
}

/// Checks the attributes carried by a field kind.
pub fn validate_field_type_attributes(kind: &FieldKind) -> ValidationResult<()> {
    let validator = attribute_validator(kind.field_type());
    ValidationError::into_result(validator(kind))
}

pub type AttributeValidator = fn(&FieldKind) -> Vec<ValidationIssue>;

/// Maps each field type to the validator for its attribute set.
pub fn attribute_validator(field_type: FieldType) -> AttributeValidator {
    match field_type {
        FieldType::Text => validate_text_attributes,
        FieldType::LongTextArea | FieldType::RichText => validate_long_text_attributes,
        FieldType::Number | FieldType::Currency | FieldType::Percent => validate_numeric_attributes,
        FieldType::Picklist | FieldType::MultiPicklist => validate_picklist_attributes,
        FieldType::Lookup | FieldType::MasterDetail => validate_relationship_attributes,
        FieldType::Formula => validate_formula_attributes,
        FieldType::AutoNumber => validate_auto_number_attributes,
        FieldType::Date
        | FieldType::DateTime
        | FieldType::Checkbox
        | FieldType::Url
        | FieldType::Email
        | FieldType::Phone => no_attributes,
    }
}

fn no_attributes(_kind: &FieldKind) -> Vec<ValidationIssue> {
    Vec::new()
}

fn validate_text_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let FieldKind::Text { length } = kind
        && !(1..=MAX_TEXT_LENGTH).contains(length)
    {
        issues.push(ValidationIssue::new(
            "length",
            "attributes.length",
            format!("length must be between 1 and {MAX_TEXT_LENGTH}"),
        ));
    }
    issues
}

fn validate_long_text_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let FieldKind::LongTextArea { length, visible_lines } | FieldKind::RichText { length, visible_lines } = kind {
        if !(1..=MAX_LONG_TEXT_LENGTH).contains(length) {
            issues.push(ValidationIssue::new(
                "length",
                "attributes.length",
                format!("length must be between 1 and {MAX_LONG_TEXT_LENGTH}"),
            ));
        }
        if !(1..=MAX_VISIBLE_LINES).contains(visible_lines) {
            issues.push(ValidationIssue::new(
                "visibleLines",
                "attributes.visible_lines",
                format!("visible lines must be between 1 and {MAX_VISIBLE_LINES}"),
            ));
        }
    }
    issues
}

fn validate_numeric_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let FieldKind::Number { precision, scale }
    | FieldKind::Currency { precision, scale }
    | FieldKind::Percent { precision, scale } = kind
    {
        if !(1..=MAX_NUMERIC_PRECISION).contains(precision) {
            issues.push(ValidationIssue::new(
                "precision",
                "attributes.precision",
                format!("precision must be between 1 and {MAX_NUMERIC_PRECISION}"),
            ));
        }
        if scale > precision {
            issues.push(ValidationIssue::new(
                "scale",
                "attributes.scale",
                "scale cannot exceed precision",
            ));
        }
    }
    issues
}

fn validate_picklist_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(options) = kind.options() else {
        return issues;
    };
    if options.is_empty() {
        issues.push(ValidationIssue::new("options", "options.required", PICKLIST_OPTIONS_MESSAGE));
    }
    let mut seen: Vec<String> = Vec::with_capacity(options.len());
    for option in options {
        let trimmed = option.trim();
        if trimmed.is_empty() {
            issues.push(ValidationIssue::new("options", "options.blank", "options cannot be blank"));
            continue;
        }
        let normalized = trimmed.to_lowercase();
        if seen.contains(&normalized) {
            issues.push(ValidationIssue::new(
                "options",
                "options.duplicate",
                format!("duplicate option '{trimmed}'"),
            ));
        } else {
            seen.push(normalized);
        }
    }
    if let FieldKind::MultiPicklist { visible_lines, .. } = kind
        && !(1..=MAX_VISIBLE_LINES).contains(visible_lines)
    {
        issues.push(ValidationIssue::new(
            "visibleLines",
            "attributes.visible_lines",
            format!("visible lines must be between 1 and {MAX_VISIBLE_LINES}"),
        ));
    }
    issues
}

fn validate_relationship_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let Some(reference) = kind.reference_object() {
        if reference.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "referenceObject",
                "reference.required",
                format!("{} requires a reference object", kind.field_type()),
            ));
        } else if !is_valid_api_name(reference) {
            issues.push(ValidationIssue::new(
                "referenceObject",
                "api_name.syntax",
                API_NAME_MESSAGE,
            ));
        }
    }
    issues
}

fn validate_formula_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let FieldKind::Formula { formula, return_type } = kind {
        if formula.trim().is_empty() {
            issues.push(ValidationIssue::new("formula", "formula.required", "Formula is required"));
        }
        if !FieldType::FORMULA_RETURN_TYPES.contains(return_type) {
            issues.push(ValidationIssue::new(
                "returnType",
                "formula.return_type",
                format!("formula cannot return {return_type}"),
            ));
        }
    }
    issues
}

fn validate_auto_number_attributes(kind: &FieldKind) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let FieldKind::AutoNumber {
        display_format,
        starting_number,
    } = kind
    {
        if AUTO_NUMBER_PLACEHOLDER.find_iter(display_format).count() != 1 {
            issues.push(ValidationIssue::new(
                "displayFormat",
                "attributes.display_format",
                "display format must contain exactly one {0…} placeholder",
            ));
        }
        if *starting_number > MAX_AUTO_NUMBER {
            issues.push(ValidationIssue::new(
                "startingNumber",
                "attributes.starting_number",
                format!("starting number cannot exceed {MAX_AUTO_NUMBER}"),
            ));
        }
    }
    issues
}

/// Checks a default value against the field kind it would be stored under.
pub fn validate_default_value(kind: &FieldKind, value: &Value) -> ValidationResult<()> {
    if value.is_null() {
        return Ok(());
    }
    if kind.field_type().is_read_only() {
        return Err(ValidationError::single(
            "defaultValue",
            "default.read_only",
            format!("{} fields cannot have a default value", kind.field_type()),
        ));
    }
    let issues = validate_field_value("defaultValue", kind, value);
    ValidationError::into_result(issues)
}

/// Checks a single record value against a field kind.
///
/// `null` is accepted here; whether a value may be absent is the caller's
/// concern (required flags). Read-only types are rejected outright.
pub fn validate_field_value(field_name: &str, kind: &FieldKind, value: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if value.is_null() {
        return issues;
    }
    let mut push = |code: &str, message: String| issues.push(ValidationIssue::new(field_name, code, message));

    match kind {
        FieldKind::Text { length }
        | FieldKind::LongTextArea { length, .. }
        | FieldKind::RichText { length, .. } => match value.as_str() {
            Some(text) if text.chars().count() > *length as usize => {
                push("value.length", format!("value cannot exceed {length} characters"));
            }
            Some(_) => {}
            None => push("value.type", "expected a string".to_string()),
        },
        FieldKind::Number { precision, scale }
        | FieldKind::Currency { precision, scale }
        | FieldKind::Percent { precision, scale } => match value {
            Value::Number(number) => {
                if let Some(message) = check_numeric_digits(number, *precision, *scale) {
                    push("value.precision", message);
                }
            }
            _ => push("value.type", "expected a number".to_string()),
        },
        FieldKind::Checkbox => {
            if !value.is_boolean() {
                push("value.type", "expected true or false".to_string());
            }
        }
        FieldKind::Date => match value.as_str() {
            Some(text) if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() => {}
            _ => push("value.date", "expected a date formatted YYYY-MM-DD".to_string()),
        },
        FieldKind::DateTime => match value.as_str() {
            Some(text) if DateTime::parse_from_rfc3339(text).is_ok() => {}
            _ => push("value.datetime", "expected an RFC 3339 date-time".to_string()),
        },
        FieldKind::Picklist { options } => match value.as_str() {
            Some(choice) if options.iter().any(|option| option == choice) => {}
            Some(choice) => push("value.picklist", format!("'{choice}' is not a valid option")),
            None => push("value.type", "expected a string".to_string()),
        },
        FieldKind::MultiPicklist { options, .. } => match value.as_array() {
            Some(choices) => {
                let mut seen: Vec<&str> = Vec::with_capacity(choices.len());
                for choice in choices {
                    match choice.as_str() {
                        Some(choice) if seen.contains(&choice) => {
                            push("value.picklist", format!("'{choice}' is selected more than once"));
                        }
                        Some(choice) if options.iter().any(|option| option == choice) => seen.push(choice),
                        Some(choice) => push("value.picklist", format!("'{choice}' is not a valid option")),
                        None => push("value.type", "expected a list of strings".to_string()),
                    }
                }
            }
            None => push("value.type", "expected a list of strings".to_string()),
        },
        FieldKind::Lookup { .. } | FieldKind::MasterDetail { .. } => match value.as_str() {
            Some(id) if !id.trim().is_empty() => {}
            _ => push("value.type", "expected a record id".to_string()),
        },
        FieldKind::Url => match value.as_str() {
            Some(text) if is_valid_url(text) => {}
            _ => push("value.url", "expected a valid URL".to_string()),
        },
        FieldKind::Email => match value.as_str() {
            Some(text) if is_valid_email(text) => {}
            _ => push("value.email", "expected a valid email address".to_string()),
        },
        FieldKind::Phone => match value.as_str() {
            Some(text) if text.chars().count() > MAX_PHONE_LENGTH => {
                push("value.length", format!("value cannot exceed {MAX_PHONE_LENGTH} characters"));
            }
            Some(_) => {}
            None => push("value.type", "expected a string".to_string()),
        },
        FieldKind::Formula { .. } | FieldKind::AutoNumber { .. } => {
            push("value.read_only", format!("{} fields are read-only", kind.field_type()));
        }
    }

    issues
}

fn check_numeric_digits(number: &serde_json::Number, precision: u8, scale: u8) -> Option<String> {
    let repr = match number.as_f64() {
        Some(float) if number.is_f64() => {
            if !float.is_finite() {
                return Some("value must be finite".to_string());
            }
            format!("{float}")
        }
        _ => number.to_string(),
    };
    let unsigned = repr.trim_start_matches('-');
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let integer_digits = integer.trim_start_matches('0').len();
    let fraction_digits = fraction.trim_end_matches('0').len();
    let max_integer_digits = usize::from(precision.saturating_sub(scale));

    if fraction_digits > usize::from(scale) {
        return Some(format!("value cannot have more than {scale} decimal places"));
    }
    if integer_digits > max_integer_digits {
        return Some(format!(
            "value cannot have more than {max_integer_digits} digits before the decimal point"
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_name_validation() {
        assert!(validate_api_name("Project__c").is_ok());
        assert!(validate_api_name("_private").is_ok());
        let err = validate_api_name("1Bad").unwrap_err();
        assert_eq!(err.issues[0].message, API_NAME_MESSAGE);
        assert!(validate_api_name("").is_err());
        assert!(validate_api_name("Has Space").is_err());
        assert!(validate_api_name("dash-name").is_err());
    }

    #[test]
    fn label_validation() {
        assert!(validate_required_label("Project").is_ok());
        let err = validate_required_label("   ").unwrap_err();
        assert_eq!(err.issues[0].message, LABEL_REQUIRED_MESSAGE);
    }

    #[test]
    fn picklist_requires_an_option() {
        let err = validate_field_type_attributes(&FieldKind::picklist(Vec::<String>::new())).unwrap_err();
        assert!(err.has_code("options.required"));

        let err = validate_field_type_attributes(&FieldKind::picklist(["Open", "open", " "])).unwrap_err();
        assert!(err.has_code("options.duplicate"));
        assert!(err.has_code("options.blank"));

        assert!(validate_field_type_attributes(&FieldKind::picklist(["Open", "Closed"])).is_ok());
    }

    #[test]
    fn numeric_attribute_bounds() {
        assert!(validate_field_type_attributes(&FieldKind::number(18, 2)).is_ok());
        assert!(validate_field_type_attributes(&FieldKind::number(0, 0)).is_err());
        assert!(validate_field_type_attributes(&FieldKind::number(19, 0)).is_err());
        let err = validate_field_type_attributes(&FieldKind::currency(4, 5)).unwrap_err();
        assert!(err.has_code("attributes.scale"));
    }

    #[test]
    fn formula_and_relationship_attributes() {
        assert!(validate_field_type_attributes(&FieldKind::formula("Amount__c * 2", FieldType::Currency)).is_ok());
        let err = validate_field_type_attributes(&FieldKind::formula("", FieldType::Picklist)).unwrap_err();
        assert!(err.has_code("formula.required"));
        assert!(err.has_code("formula.return_type"));

        assert!(validate_field_type_attributes(&FieldKind::lookup("Account")).is_ok());
        assert!(validate_field_type_attributes(&FieldKind::lookup("")).is_err());
        assert!(validate_field_type_attributes(&FieldKind::master_detail("9Bad")).is_err());
    }

    #[test]
    fn auto_number_format_needs_one_placeholder() {
        let kind = FieldKind::with_defaults(FieldType::AutoNumber);
        assert!(validate_field_type_attributes(&kind).is_ok());
        let kind = FieldKind::AutoNumber {
            display_format: "INV-".to_string(),
            starting_number: 1,
        };
        assert!(validate_field_type_attributes(&kind).is_err());
    }

    #[test]
    fn auto_number_start_is_bounded() {
        let kind = FieldKind::AutoNumber {
            display_format: "A-{0}".to_string(),
            starting_number: u64::MAX,
        };
        let err = validate_field_type_attributes(&kind).unwrap_err();
        assert!(err.has_code("attributes.starting_number"));
        let kind = FieldKind::AutoNumber {
            display_format: "A-{0}".to_string(),
            starting_number: MAX_AUTO_NUMBER,
        };
        assert!(validate_field_type_attributes(&kind).is_ok());
    }

    #[test]
    fn numeric_values_respect_precision_and_scale() {
        let kind = FieldKind::currency(6, 2);
        assert!(validate_field_value("Amount__c", &kind, &json!(1234.5)).is_empty());
        assert!(validate_field_value("Amount__c", &kind, &json!(-9999)).is_empty());
        assert_eq!(validate_field_value("Amount__c", &kind, &json!(12345)).len(), 1);
        assert_eq!(validate_field_value("Amount__c", &kind, &json!(1.234)).len(), 1);
        assert_eq!(validate_field_value("Amount__c", &kind, &json!("12")).len(), 1);
    }

    #[test]
    fn typed_values() {
        assert!(validate_field_value("d", &FieldKind::Date, &json!("2024-02-29")).is_empty());
        assert!(!validate_field_value("d", &FieldKind::Date, &json!("2023-02-29")).is_empty());
        assert!(validate_field_value("t", &FieldKind::DateTime, &json!("2024-01-01T10:00:00Z")).is_empty());
        assert!(validate_field_value("e", &FieldKind::Email, &json!("ops@example.com")).is_empty());
        assert!(!validate_field_value("e", &FieldKind::Email, &json!("nope")).is_empty());
        assert!(validate_field_value("u", &FieldKind::Url, &json!("https://example.com")).is_empty());
        assert!(!validate_field_value("c", &FieldKind::Checkbox, &json!("yes")).is_empty());
        assert!(!validate_field_value("t", &FieldKind::text(3), &json!("abcd")).is_empty());
        assert!(validate_field_value("t", &FieldKind::text(3), &Value::Null).is_empty());
    }

    #[test]
    fn picklist_values() {
        let kind = FieldKind::picklist(["Open", "Closed"]);
        assert!(validate_field_value("s", &kind, &json!("Open")).is_empty());
        assert!(!validate_field_value("s", &kind, &json!("Pending")).is_empty());

        let multi = FieldKind::MultiPicklist {
            options: vec!["Red".into(), "Blue".into()],
            visible_lines: 4,
        };
        assert!(validate_field_value("m", &multi, &json!(["Red", "Blue"])).is_empty());
        assert_eq!(validate_field_value("m", &multi, &json!(["Red", "Red"])).len(), 1);
        assert_eq!(validate_field_value("m", &multi, &json!("Red")).len(), 1);
    }

    #[test]
    fn default_values() {
        assert!(validate_default_value(&FieldKind::Checkbox, &json!(true)).is_ok());
        assert!(validate_default_value(&FieldKind::picklist(["A"]), &json!("B")).is_err());
        let err = validate_default_value(&FieldKind::formula("1", FieldType::Number), &json!(1)).unwrap_err();
        assert!(err.has_code("default.read_only"));
    }
}
