//! Declarative column layout for wizard-step tables.
//!
//! A [`FieldSchema`] lists the columns of a step in display order. Each
//! column names the [`LineItemField`] it is bound to and a closed
//! [`FieldKind`]; renderers implement [`FieldVisitor`] and get a typed
//! value per kind instead of poking at a config map.

use crate::models::LineItem;
use crate::models::UserRef;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Line item attributes a column can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineItemField {
    ProductCode,
    ProductName,
    BinLocationName,
    LotNumber,
    ExpirationDate,
    QuantityShipped,
    Uom,
    Recipient,
    PalletName,
    BoxName,
    SplitLineItems,
}

impl LineItemField {
    /// Key of the attribute in the wire format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductCode => "productCode",
            Self::ProductName => "productName",
            Self::BinLocationName => "binLocationName",
            Self::LotNumber => "lotNumber",
            Self::ExpirationDate => "expirationDate",
            Self::QuantityShipped => "quantityShipped",
            Self::Uom => "uom",
            Self::Recipient => "recipient",
            Self::PalletName => "palletName",
            Self::BoxName => "boxName",
            Self::SplitLineItems => "splitLineItems",
        }
    }

    /// Display text of the attribute on `item`, `None` when unset.
    pub fn display_value(self, item: &LineItem) -> Option<Cow<'_, str>> {
        fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
            value.as_deref().map(Cow::Borrowed)
        }

        match self {
            Self::ProductCode => text(&item.product_code),
            Self::ProductName => text(&item.product_name),
            Self::BinLocationName => text(&item.bin_location_name),
            Self::LotNumber => text(&item.lot_number),
            Self::ExpirationDate => text(&item.expiration_date),
            Self::QuantityShipped => item
                .quantity_shipped
                .as_ref()
                .map(|qty| Cow::Owned(qty.to_string())),
            Self::Uom => text(&item.uom),
            Self::Recipient => item.recipient.as_ref().map(|user| Cow::Borrowed(user.label())),
            Self::PalletName => text(&item.pallet_name),
            Self::BoxName => text(&item.box_name),
            Self::SplitLineItems => {
                if item.split_line_items.is_empty() {
                    None
                } else {
                    Some(Cow::Owned(item.split_line_items.len().to_string()))
                }
            }
        }
    }

    /// Whether the attribute holds a value, used by required-field checks.
    pub fn is_present(self, item: &LineItem) -> bool {
        match self {
            Self::Recipient => item.recipient.is_some(),
            Self::SplitLineItems => !item.split_line_items.is_empty(),
            other => other
                .display_value(item)
                .is_some_and(|value| !value.trim().is_empty()),
        }
    }
}

/// Options of an asynchronous select column.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSpec {
    /// Options are looked up remotely as the user types.
    pub async_options: bool,
    /// Attribute of an option used as its label.
    pub label_key: &'static str,
    pub show_value_tooltip: bool,
    pub open_on_click: bool,
    pub autoload: bool,
    pub cache: bool,
}

/// A column that opens a nested editor for the row.
#[derive(Debug, Clone, PartialEq)]
pub struct SubFormSpec {
    pub title: &'static str,
    pub open_button_text: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Read-only text.
    Label,
    /// Free text input.
    Text,
    Select(SelectSpec),
    SubForm(SubFormSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field: LineItemField,
    pub label: &'static str,
    /// Relative column width.
    pub flex_width: f32,
    pub kind: FieldKind,
    pub required: bool,
    pub class_name: Option<&'static str>,
}

impl FieldSpec {
    fn new(field: LineItemField, label: &'static str, flex_width: f32, kind: FieldKind) -> Self {
        Self {
            field,
            label,
            flex_width,
            kind,
            required: false,
            class_name: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn class_name(mut self, class_name: &'static str) -> Self {
        self.class_name = Some(class_name);
        self
    }

    pub fn accept<V: FieldVisitor>(&self, visitor: &mut V, row: RowRef<'_>) -> V::Output {
        match &self.kind {
            FieldKind::Label => visitor.visit_label(self, self.field.display_value(row.item)),
            FieldKind::Text => visitor.visit_text(self, self.field.display_value(row.item)),
            FieldKind::Select(select) => {
                visitor.visit_select(self, select, row.item.recipient.as_ref())
            }
            FieldKind::SubForm(sub_form) => visitor.visit_sub_form(self, sub_form, row),
        }
    }
}

/// A row handed to a visitor: its position and the item itself.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    pub index: usize,
    pub item: &'a LineItem,
}

/// Render contract, one method per [`FieldKind`].
pub trait FieldVisitor {
    type Output;

    fn visit_label(&mut self, spec: &FieldSpec, value: Option<Cow<'_, str>>) -> Self::Output;

    fn visit_text(&mut self, spec: &FieldSpec, value: Option<Cow<'_, str>>) -> Self::Output;

    fn visit_select(
        &mut self,
        spec: &FieldSpec,
        select: &SelectSpec,
        value: Option<&UserRef>,
    ) -> Self::Output;

    fn visit_sub_form(
        &mut self,
        spec: &FieldSpec,
        sub_form: &SubFormSpec,
        row: RowRef<'_>,
    ) -> Self::Output;
}

/// Columns of one step's item table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Name of the item collection in form values and on the wire.
    pub collection: &'static str,
    /// Rows are rendered lazily by the host.
    pub virtualized: bool,
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn field(&self, field: LineItemField) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|spec| spec.required)
    }

    pub fn total_flex(&self) -> f32 {
        self.fields.iter().map(|spec| spec.flex_width).sum()
    }

    pub fn render_row<V: FieldVisitor>(
        &self,
        visitor: &mut V,
        index: usize,
        item: &LineItem,
    ) -> Vec<V::Output> {
        let row = RowRef { index, item };
        self.fields
            .iter()
            .map(|spec| spec.accept(visitor, row))
            .collect()
    }
}

/// Column layout of the packing step.
pub fn packing_schema() -> &'static FieldSchema {
    static SCHEMA: OnceLock<FieldSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        use FieldKind::Label;
        use FieldKind::Text;
        use LineItemField as F;

        FieldSchema {
            collection: "packPageItems",
            virtualized: true,
            fields: vec![
                FieldSpec::new(F::ProductCode, "Code", 0.7, Label),
                FieldSpec::new(F::ProductName, "Product Name", 3.0, Label)
                    .class_name("text-left ml-1"),
                FieldSpec::new(F::BinLocationName, "Bin Location", 1.0, Label),
                FieldSpec::new(F::LotNumber, "Lot/Serial No", 1.0, Label),
                FieldSpec::new(F::ExpirationDate, "Expires", 1.0, Label),
                FieldSpec::new(F::QuantityShipped, "Shipped", 0.8, Label),
                FieldSpec::new(F::Uom, "UOM", 0.8, Label),
                FieldSpec::new(
                    F::Recipient,
                    "Recipient",
                    2.5,
                    FieldKind::Select(SelectSpec {
                        async_options: true,
                        label_key: "name",
                        show_value_tooltip: true,
                        open_on_click: false,
                        autoload: false,
                        cache: false,
                    }),
                )
                .required(),
                FieldSpec::new(F::PalletName, "Pallet", 0.8, Text),
                FieldSpec::new(F::BoxName, "Box", 0.8, Text),
                FieldSpec::new(
                    F::SplitLineItems,
                    "Split Line",
                    1.0,
                    FieldKind::SubForm(SubFormSpec {
                        title: "Split Line",
                        open_button_text: "Split Line",
                    }),
                ),
            ],
        }
    })
}
