//! Plain-text rendering of a step's item table.

use std::borrow::Cow;
use stockflow_protocol::FieldSchema;
use stockflow_protocol::FieldSpec;
use stockflow_protocol::FieldVisitor;
use stockflow_protocol::LineItem;
use stockflow_protocol::UserRef;
use stockflow_protocol::schema::RowRef;
use stockflow_protocol::schema::SelectSpec;
use stockflow_protocol::schema::SubFormSpec;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Terminal columns per unit of `flex_width`.
pub const DEFAULT_UNIT_WIDTH: usize = 8;

const MIN_COLUMN_WIDTH: usize = 4;
const MISSING_REQUIRED: &str = "(required)";

/// Turns each schema cell into its display text.
#[derive(Debug, Default)]
pub struct CellText;

impl FieldVisitor for CellText {
    type Output = String;

    fn visit_label(&mut self, _spec: &FieldSpec, value: Option<Cow<'_, str>>) -> String {
        value.map(Cow::into_owned).unwrap_or_default()
    }

    fn visit_text(&mut self, _spec: &FieldSpec, value: Option<Cow<'_, str>>) -> String {
        value.map(Cow::into_owned).unwrap_or_default()
    }

    fn visit_select(
        &mut self,
        spec: &FieldSpec,
        _select: &SelectSpec,
        value: Option<&UserRef>,
    ) -> String {
        match value {
            Some(user) => user.label().to_string(),
            None if spec.required => MISSING_REQUIRED.to_string(),
            None => String::new(),
        }
    }

    fn visit_sub_form(
        &mut self,
        _spec: &FieldSpec,
        _sub_form: &SubFormSpec,
        row: RowRef<'_>,
    ) -> String {
        match row.item.split_line_items.len() {
            0 => String::new(),
            1 => "1 split".to_string(),
            n => format!("{n} splits"),
        }
    }
}

fn column_width(spec: &FieldSpec, unit_width: usize) -> usize {
    let width = (spec.flex_width * unit_width as f32).round() as usize;
    width.max(MIN_COLUMN_WIDTH)
}

/// Pad or truncate `text` to exactly `width` display columns.
fn fit(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        return format!("{text}{}", " ".repeat(width - text_width));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Render `items` as a fixed-width table, one line per item, with a 1-based
/// row number in front.
pub fn render_table(schema: &FieldSchema, items: &[LineItem], unit_width: usize) -> String {
    let widths: Vec<usize> = schema
        .fields
        .iter()
        .map(|spec| column_width(spec, unit_width))
        .collect();
    let index_width = items.len().to_string().len().max(1);

    let mut lines = Vec::with_capacity(items.len() + 1);
    let header: Vec<String> = schema
        .fields
        .iter()
        .zip(&widths)
        .map(|(spec, width)| fit(spec.label, *width))
        .collect();
    lines.push(format!("{} {}", fit("#", index_width), header.join(" ")));

    let mut visitor = CellText;
    for (index, item) in items.iter().enumerate() {
        let cells: Vec<String> = schema
            .render_row(&mut visitor, index, item)
            .iter()
            .zip(&widths)
            .map(|(cell, width)| fit(cell, *width))
            .collect();
        lines.push(format!(
            "{} {}",
            fit(&(index + 1).to_string(), index_width),
            cells.join(" ")
        ));
    }

    lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
