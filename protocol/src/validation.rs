//! Required-field checks run before any submission leaves the client.

use crate::models::LineItem;
use crate::models::LineItemId;
use crate::schema::FieldSchema;
use std::fmt;

/// A required column left empty on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub row: usize,
    pub line_id: LineItemId,
    pub field: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub missing: Vec<MissingField>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} required field(s) missing", self.missing.len())?;
        for (i, missing) in self.missing.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(
                f,
                "{sep}{} on row {} (line {})",
                missing.label,
                missing.row + 1,
                missing.line_id
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks every row against the schema's required columns.
///
/// Split sub-items are not checked here; the split editor owns their rules.
pub fn validate_items(schema: &FieldSchema, items: &[LineItem]) -> Result<(), ValidationErrors> {
    let missing: Vec<MissingField> = items
        .iter()
        .enumerate()
        .flat_map(|(row, item)| {
            schema
                .required_fields()
                .filter(move |spec| !spec.field.is_present(item))
                .map(move |spec| MissingField {
                    row,
                    line_id: item.id.clone(),
                    field: spec.field.as_str(),
                    label: spec.label,
                })
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { missing })
    }
}
