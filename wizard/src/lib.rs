//! Wizard-step engine.
//!
//! [`StepController`] owns the editable items of one wizard step and drives
//! the fetch → edit → save/advance/refresh cycle against a
//! [`RemoteStepStore`](stockflow_store::RemoteStepStore). The surrounding
//! wizard is reached through [`WizardHost`].

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod recipients;
pub mod sequence;
pub mod split;


pub use config::ConfigLoader;
pub use config::SubmitPolicy;
pub use config::WizardConfig;
pub use controller::StepController;
pub use controller::StepPhase;
pub use error::StepError;
pub use host::ConfirmPrompt;
pub use host::Notice;
pub use host::RefreshOutcome;
pub use host::WizardHost;
pub use recipients::RecipientSearch;
pub use split::SplitError;
pub use split::apply_split;
