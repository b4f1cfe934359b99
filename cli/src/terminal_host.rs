//! [`WizardHost`] for an interactive terminal.

use async_trait::async_trait;
use std::io::Write;
use stockflow_protocol::StepState;
use stockflow_wizard::ConfirmPrompt;
use stockflow_wizard::WizardHost;

/// Prints wizard navigation and asks confirmations on stdin.
#[derive(Debug, Clone)]
pub struct TerminalHost {
    assume_yes: bool,
}

impl TerminalHost {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// True when `answer` accepts `prompt`: `y`, `yes`, or the confirm label.
pub fn is_confirmation(answer: &str, prompt: &ConfirmPrompt) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case(prompt.confirm_label)
}

#[async_trait]
impl WizardHost for TerminalHost {
    async fn on_submit(&self, values: StepState) {
        println!(
            "Packing complete: {} line item(s) handed to the next step.",
            values.items.len()
        );
    }

    async fn previous_page(&self, values: StepState) {
        println!(
            "Back to the previous step with {} line item(s).",
            values.items.len()
        );
    }

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!(
            "{}: {} [{}/{}] ",
            prompt.title, prompt.message, prompt.confirm_label, prompt.cancel_label
        );
        let _ = std::io::stderr().flush();

        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match read {
            Ok(Ok(line)) => is_confirmation(&line, prompt),
            Ok(Err(err)) => {
                tracing::warn!("failed to read confirmation: {err}");
                false
            }
            Err(err) => {
                tracing::warn!("confirmation reader panicked: {err}");
                false
            }
        }
    }
}
