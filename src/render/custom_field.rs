use chrono::NaiveDate;

use crate::domain::{CustomFieldDefinition, FieldType};

/// Display text for a custom-field value, or `None` when the value cannot be
/// shown and the placeholder should stay as written.
pub fn format(field_type: FieldType, raw_value: Option<&str>, options: Option<&[String]>) -> Option<String> {
    let raw = raw_value?;
    match field_type {
        FieldType::Text | FieldType::Number => non_empty(raw),
        FieldType::Date => format_date(raw),
        FieldType::Picklist => {
            let raw = non_empty(raw)?;
            options?.iter().any(|o| o == &raw).then_some(raw)
        }
    }
}

/// Formats `raw_value` under `definition`. Inactive definitions never resolve.
pub fn format_with(definition: &CustomFieldDefinition, raw_value: Option<&str>) -> Option<String> {
    if !definition.is_active {
        return None;
    }
    format(definition.field_type, raw_value, definition.options.as_deref())
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// `2024-03-05T17:45:00.000Z` becomes `2024-03-05`. A value that is already
/// date-only passes through; anything else stays unresolved.
fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
