use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Identifier of a line item.
///
/// The server is not consistent about ids: some endpoints send strings,
/// others integers. Both are accepted and kept as a string, which is also
/// what goes back out on save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(transparent)]
pub struct LineItemId(String);

impl LineItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LineItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for LineItemId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for LineItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Uint(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Int(n) => Self(n.to_string()),
            RawId::Uint(n) => Self(n.to_string()),
        })
    }
}

/// Reference to a user, used as the recipient of a packed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserRef {
    pub id: LineItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fields such as `firstName`/`lastName` that are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRef {
    pub fn new(id: impl Into<LineItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// Label shown in the recipient column; falls back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// One shipment record of a packing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Kept as the server's number so `5` goes back as `5`, not `5.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_shipped: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    // Editable fields are always sent, so clearing one reaches the server as
    // an explicit null.
    #[serde(default)]
    pub recipient: Option<UserRef>,
    #[serde(default)]
    pub pallet_name: Option<String>,
    #[serde(default)]
    pub box_name: Option<String>,
    #[serde(default)]
    pub split_line_items: Vec<LineItem>,
    /// Server-side fields this client does not interpret. They are echoed
    /// back on save so a full-replace does not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    pub fn new(id: impl Into<LineItemId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Which wizard step a store call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    pub stock_movement_id: String,
    pub step_number: u32,
}

impl StepContext {
    pub fn new(stock_movement_id: impl Into<String>, step_number: u32) -> Self {
        Self {
            stock_movement_id: stock_movement_id.into(),
            step_number,
        }
    }

    /// Packing step of the given stock movement.
    pub fn packing(stock_movement_id: impl Into<String>) -> Self {
        Self::new(stock_movement_id, crate::PACKING_STEP_NUMBER)
    }
}

/// Local editable state of one wizard step.
///
/// `items` is kept in server order, which is also display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepState {
    pub stock_movement_id: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl StepState {
    pub fn new(stock_movement_id: impl Into<String>) -> Self {
        Self {
            stock_movement_id: stock_movement_id.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, id: &LineItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Returns the first id that occurs more than once, if any.
    pub fn check_unique_ids(items: &[LineItem]) -> Result<(), LineItemId> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(&item.id) {
                return Err(item.id.clone());
            }
        }
        Ok(())
    }
}
