//! JSON envelopes exchanged with the stock-movement API.

use crate::models::LineItem;
use crate::models::UserRef;
use serde::Deserialize;
use serde::Serialize;

/// Response of both the step fetch and the step save:
/// `{ "data": { "packPage": { "packPageItems": [...] } } }`.
///
/// Every level is required. A body missing any of them is malformed, not an
/// empty step.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StepEnvelope {
    pub data: StepData,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    pub pack_page: PackPage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackPage {
    pub pack_page_items: Vec<LineItem>,
}

impl StepEnvelope {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self {
            data: StepData {
                pack_page: PackPage {
                    pack_page_items: items,
                },
            },
        }
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.data.pack_page.pack_page_items
    }
}

/// Body of `POST /stockMovements/{id}`. Always carries the full collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStepRequest {
    pub id: String,
    /// The API expects the step number as a string.
    pub step_number: String,
    pub pack_page_items: Vec<LineItem>,
}

impl SaveStepRequest {
    pub fn new(stock_movement_id: &str, step_number: u32, items: Vec<LineItem>) -> Self {
        Self {
            id: stock_movement_id.to_string(),
            step_number: step_number.to_string(),
            pack_page_items: items,
        }
    }
}

/// Body of `POST /stockMovements/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransitionRequest {
    pub status: String,
}

/// Response of `GET /persons?name=...`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsersEnvelope {
    #[serde(default)]
    pub data: Vec<UserRef>,
}
