//! Folding split-line edits into the item collection.

use stockflow_protocol::LineItem;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("split targets row {index} but only {len} line item(s) exist")]
    OutOfRange { index: usize, len: usize },
}

/// Returns `items` with the split sub-items of row `line_index` replaced by
/// `split_items`.
///
/// Nothing else changes: order, length, and every other field of every row
/// (the parent's recipient, pallet and box included) are preserved. Split
/// quantities are not checked here.
pub fn apply_split(
    items: &[LineItem],
    line_index: usize,
    split_items: Vec<LineItem>,
) -> Result<Vec<LineItem>, SplitError> {
    if line_index >= items.len() {
        return Err(SplitError::OutOfRange {
            index: line_index,
            len: items.len(),
        });
    }

    let mut updated = items.to_vec();
    updated[line_index].split_line_items = split_items;
    Ok(updated)
}
