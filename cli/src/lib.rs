//! `stockflow` command line.
//!
//! Drives the packing step of one stock movement against a live server.
//!
//! ## Commands
//!
//! - `stockflow show --movement <ID>`
//! - `stockflow save --movement <ID> [--recipient ROW=USER] [--pallet ROW=NAME] [--box ROW=NAME]`
//! - `stockflow split --movement <ID> --row <ROW> --file <SPLIT.json>`
//! - `stockflow advance --movement <ID> [edits]`
//! - `stockflow back --movement <ID>`
//! - `stockflow refresh --movement <ID> [--yes]`
//! - `stockflow recipients <QUERY>`

pub mod render;
pub mod terminal_host;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stockflow_protocol::LineItem;
use stockflow_protocol::UserRef;
use stockflow_store::HttpStepStore;
use stockflow_store::RemoteStepStore;
use stockflow_wizard::ConfigLoader;
use stockflow_wizard::RecipientSearch;
use stockflow_wizard::RefreshOutcome;
use stockflow_wizard::StepController;
use stockflow_wizard::StepError;
use stockflow_wizard::WizardConfig;
use terminal_host::TerminalHost;

#[derive(Debug, Parser)]
#[command(name = "stockflow", version, about = "Packing step of the stock-movement wizard")]
pub struct Cli {
    /// Override the API base url (e.g. http://host/openboxes/api).
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Directory holding config.toml (defaults to $STOCKFLOW_HOME or ~/.stockflow).
    #[arg(long = "config-home", global = true)]
    pub config_home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and print the step's line items.
    Show(ShowArgs),
    /// Apply edits and save.
    Save(EditArgs),
    /// Replace a row's split lines and save right away.
    Split(SplitArgs),
    /// Apply edits, save, and move the stock movement to the next status.
    Advance(EditArgs),
    /// Return to the previous step without saving.
    Back(MovementArgs),
    /// Discard unsaved changes and reload from the server.
    Refresh(RefreshArgs),
    /// Look up users by name.
    Recipients(RecipientsArgs),
}

#[derive(Debug, Args)]
pub struct MovementArgs {
    /// Stock movement id.
    #[arg(long = "movement", short = 'm')]
    pub movement: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: MovementArgs,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

/// `ROW=VALUE`, with rows counted from 1 as printed by `show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValue {
    pub row: usize,
    pub value: String,
}

pub fn parse_row_value(raw: &str) -> Result<RowValue, String> {
    let (row, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ROW=VALUE, got `{raw}`"))?;
    let row: usize = row
        .trim()
        .parse()
        .map_err(|_| format!("row must be a positive integer, got `{row}`"))?;
    if row == 0 {
        return Err("rows are numbered from 1".to_string());
    }
    Ok(RowValue {
        row: row - 1,
        value: value.trim().to_string(),
    })
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: MovementArgs,

    /// Set a row's recipient by user id (ROW=USER_ID). Repeatable.
    #[arg(long = "recipient", value_parser = parse_row_value)]
    pub recipients: Vec<RowValue>,

    /// Set a row's pallet name (ROW=NAME, empty clears). Repeatable.
    #[arg(long = "pallet", value_parser = parse_row_value)]
    pub pallets: Vec<RowValue>,

    /// Set a row's box name (ROW=NAME, empty clears). Repeatable.
    #[arg(long = "box", value_parser = parse_row_value)]
    pub boxes: Vec<RowValue>,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    #[command(flatten)]
    pub target: MovementArgs,

    /// Row to split, counted from 1.
    #[arg(long = "row", short = 'r')]
    pub row: usize,

    /// JSON array of split line items.
    #[arg(long = "file", short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    #[command(flatten)]
    pub target: MovementArgs,

    /// Do not ask for confirmation.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct RecipientsArgs {
    /// Name, or part of it.
    pub query: String,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let store: Arc<dyn RemoteStepStore> = Arc::new(
            HttpStepStore::with_timeout(&config.base_url, config.request_timeout())
                .with_context(|| format!("invalid base url `{}`", config.base_url))?,
        );

        match self.command {
            Command::Show(args) => cmd_show(&config, store, &args).await,
            Command::Save(args) => cmd_save(&config, store, &args).await,
            Command::Split(args) => cmd_split(&config, store, &args).await,
            Command::Advance(args) => cmd_advance(&config, store, &args).await,
            Command::Back(args) => cmd_back(&config, store, &args).await,
            Command::Refresh(args) => cmd_refresh(&config, store, &args).await,
            Command::Recipients(args) => cmd_recipients(&config, store, &args).await,
        }
    }

    fn load_config(&self) -> anyhow::Result<WizardConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(home) = &self.config_home {
            loader = loader.with_home(home.clone());
        }
        let mut config = loader.load().context("failed to load configuration")?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        tracing::debug!(base_url = %config.base_url, "configuration loaded");
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command implementations
// ─────────────────────────────────────────────────────────────────────────────

fn step_error(err: StepError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

async fn open(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    movement: &str,
    assume_yes: bool,
) -> anyhow::Result<StepController> {
    let host = Arc::new(TerminalHost::new(assume_yes));
    let controller = StepController::from_config(config, movement, store, host);
    controller.initialize().await.map_err(step_error)?;
    Ok(controller)
}

fn apply_edits(controller: &StepController, args: &EditArgs) -> anyhow::Result<()> {
    for edit in &args.recipients {
        let recipient = UserRef {
            id: edit.value.as_str().into(),
            name: None,
            extra: Default::default(),
        };
        controller
            .set_recipient(edit.row, Some(recipient))
            .map_err(step_error)?;
    }
    for edit in &args.pallets {
        controller
            .set_pallet_name(edit.row, non_empty(&edit.value))
            .map_err(step_error)?;
    }
    for edit in &args.boxes {
        controller
            .set_box_name(edit.row, non_empty(&edit.value))
            .map_err(step_error)?;
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn print_table(controller: &StepController) {
    let values = controller.values();
    println!(
        "{}",
        render::render_table(controller.schema(), &values.items, render::DEFAULT_UNIT_WIDTH)
    );
}

async fn cmd_show(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &ShowArgs,
) -> anyhow::Result<()> {
    let controller = open(config, store, &args.target.movement, false).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&controller.values())?);
        return Ok(());
    }

    print_table(&controller);
    if let Err(errors) = controller.validate() {
        eprintln!("{errors}");
    }
    Ok(())
}

async fn cmd_save(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &EditArgs,
) -> anyhow::Result<()> {
    let controller = open(config, store, &args.target.movement, false).await?;
    apply_edits(&controller, args)?;

    let notice = controller.save_current().await.map_err(step_error)?;
    println!("{}", notice.message());
    Ok(())
}

async fn cmd_split(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &SplitArgs,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let split_items: Vec<LineItem> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of line items", args.file.display()))?;
    let row = args
        .row
        .checked_sub(1)
        .context("rows are numbered from 1")?;

    let controller = open(config, store, &args.target.movement, false).await?;
    controller
        .save_split_lines(controller.values(), row, split_items)
        .await
        .map_err(step_error)?;

    println!("Split saved for row {}.", args.row);
    Ok(())
}

async fn cmd_advance(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &EditArgs,
) -> anyhow::Result<()> {
    let controller = open(config, store, &args.target.movement, false).await?;
    apply_edits(&controller, args)?;

    controller
        .advance(controller.values())
        .await
        .map_err(step_error)
}

async fn cmd_back(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &MovementArgs,
) -> anyhow::Result<()> {
    let controller = open(config, store, &args.movement, false).await?;
    controller
        .go_to_previous_step(controller.values())
        .await
        .map_err(step_error)
}

async fn cmd_refresh(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &RefreshArgs,
) -> anyhow::Result<()> {
    let controller = open(config, store, &args.target.movement, args.yes).await?;

    match controller.refresh().await.map_err(step_error)? {
        RefreshOutcome::Refreshed => print_table(&controller),
        RefreshOutcome::Declined => println!("Refresh cancelled."),
    }
    Ok(())
}

async fn cmd_recipients(
    config: &WizardConfig,
    store: Arc<dyn RemoteStepStore>,
    args: &RecipientsArgs,
) -> anyhow::Result<()> {
    // One-shot lookup: nothing to debounce.
    let search = RecipientSearch::new(store, Duration::ZERO, config.recipient_search_min_chars);
    let users = search
        .search(&args.query)
        .await
        .context("recipient search failed")?
        .unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else if users.is_empty() {
        println!("No matching users.");
    } else {
        for user in &users {
            println!("{}\t{}", user.id, user.label());
        }
    }
    Ok(())
}
