//! Shared data model for the stock-movement wizard steps.
//!
//! Everything here is plain data: line items as the server sends them, the
//! JSON envelopes used on the wire, the declarative field schema that drives
//! row rendering, and the required-field check run before any submission.

pub mod envelope;
pub mod flatten;
pub mod models;
pub mod schema;
pub mod validation;

pub use models::LineItem;
pub use models::LineItemId;
pub use models::StepContext;
pub use models::StepState;
pub use models::UserRef;
pub use schema::FieldKind;
pub use schema::FieldSchema;
pub use schema::FieldSpec;
pub use schema::FieldVisitor;
pub use schema::LineItemField;
pub use schema::packing_schema;
pub use validation::ValidationErrors;

/// Ordinal of the packing step within the stock-movement wizard.
pub const PACKING_STEP_NUMBER: u32 = 5;

/// Workflow status a stock movement moves to once packing is done.
pub const PACKING_NEXT_STATUS: &str = "CHECKING";
