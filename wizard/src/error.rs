use crate::split::SplitError;
use stockflow_protocol::LineItemId;
use stockflow_protocol::ValidationErrors;
use stockflow_store::StoreError;
use thiserror::Error;

/// Failure of a step operation. The controller is back in `Ready` (or still
/// `HandedOff`) whenever one of these is returned.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Required fields are missing; nothing was sent.
    #[error("form is invalid: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("no line item at row {0}")]
    NoSuchLine(usize),

    /// An edit would leave two line items with the same id.
    #[error("duplicate line item id {0}")]
    DuplicateLine(LineItemId),

    /// Rejected because another save or advance is still in flight.
    #[error("another submission is already in flight")]
    Busy,

    #[error("step was already handed off to the next wizard step")]
    HandedOff,
}

impl StepError {
    /// Short message suitable for a toast or status line.
    pub fn user_message(&self) -> String {
        match self {
            StepError::Store(StoreError::Network(_)) => "Could not reach the server.".to_string(),
            StepError::Store(StoreError::Http { status, .. }) => {
                format!("The server rejected the request (HTTP {status}).")
            }
            StepError::Store(_) => "The server sent an unexpected response.".to_string(),
            StepError::Invalid(errors) => format!("Please fix the form: {errors}"),
            StepError::Split(err) => format!("Could not split line: {err}"),
            StepError::NoSuchLine(row) => format!("Row {} does not exist.", row + 1),
            StepError::DuplicateLine(id) => format!("Line {id} appears more than once."),
            StepError::Busy => "Please wait for the current save to finish.".to_string(),
            StepError::HandedOff => "This step is already complete.".to_string(),
        }
    }
}
