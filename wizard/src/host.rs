//! The parent wizard, as seen from a step.

use async_trait::async_trait;
use stockflow_protocol::StepState;

/// Callbacks into the wizard that hosts a step.
#[async_trait]
pub trait WizardHost: Send + Sync {
    /// The step finished; move the wizard forward with `values`.
    async fn on_submit(&self, values: StepState);

    /// Go back one step, carrying the current (unsaved) values.
    async fn previous_page(&self, values: StepState);

    /// Ask the user a yes/no question. `true` means confirmed.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Text of a yes/no confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: &'static str,
    pub message: &'static str,
    pub confirm_label: &'static str,
    pub cancel_label: &'static str,
}

impl ConfirmPrompt {
    pub fn refresh() -> Self {
        Self {
            title: "Confirm refresh",
            message: "Are you sure you want to refresh? Your progress since last save will be lost.",
            confirm_label: "Yes",
            cancel_label: "No",
        }
    }
}

/// User-facing result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Saved,
    /// The step had no items, nothing was sent.
    NothingToSave,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::Saved => "Changes saved successfully!",
            Notice::NothingToSave => "Nothing to save.",
        }
    }
}

/// Outcome of [`StepController::refresh`](crate::StepController::refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Declined,
}
