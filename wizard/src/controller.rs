//! Step controller: local state and the fetch/save/advance state machine.
//!
//! ```text
//! Loading ──▶ Ready ──▶ Saving ──▶ Ready
//!               │
//!               └────▶ Advancing ──▶ HandedOff
//! ```
//!
//! Every operation returns to `Ready` on failure; there is no error state.
//! Busy phases are published on a watch channel so a host can show progress
//! without the controller touching any UI.

use crate::config::SubmitPolicy;
use crate::config::WizardConfig;
use crate::error::StepError;
use crate::host::ConfirmPrompt;
use crate::host::Notice;
use crate::host::RefreshOutcome;
use crate::host::WizardHost;
use crate::sequence::RequestSequence;
use crate::split::apply_split;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use stockflow_protocol::FieldSchema;
use stockflow_protocol::LineItem;
use stockflow_protocol::StepContext;
use stockflow_protocol::StepState;
use stockflow_protocol::UserRef;
use stockflow_protocol::ValidationErrors;
use stockflow_protocol::packing_schema;
use stockflow_protocol::validation::validate_items;
use stockflow_store::RemoteStepStore;
use stockflow_store::StoreError;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Loading,
    Ready,
    Saving,
    Advancing,
    /// The parent wizard has taken over; the step accepts no more operations.
    HandedOff,
}

impl StepPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Saving | Self::Advancing)
    }
}

struct Inner {
    state: StepState,
    /// Operations in flight, oldest first. The newest one names the phase.
    busy: Vec<(u64, StepPhase)>,
    /// Saves/advances in flight.
    submissions: usize,
    /// Some remote operation has finished, successfully or not.
    loaded: bool,
    handed_off: bool,
}

impl Inner {
    fn phase(&self) -> StepPhase {
        if self.handed_off {
            StepPhase::HandedOff
        } else if let Some((_, phase)) = self.busy.last() {
            *phase
        } else if !self.loaded {
            StepPhase::Loading
        } else {
            StepPhase::Ready
        }
    }
}

/// Owns the editable items of one wizard step.
pub struct StepController {
    ctx: StepContext,
    store: Arc<dyn RemoteStepStore>,
    host: Arc<dyn WizardHost>,
    schema: &'static FieldSchema,
    next_status: String,
    submit_policy: SubmitPolicy,
    sequence: RequestSequence,
    inner: Mutex<Inner>,
    phase_tx: watch::Sender<StepPhase>,
}

impl StepController {
    /// Controller for the packing step, starting empty in `Loading`.
    pub fn new(
        ctx: StepContext,
        store: Arc<dyn RemoteStepStore>,
        host: Arc<dyn WizardHost>,
    ) -> Self {
        let (phase_tx, _) = watch::channel(StepPhase::Loading);
        Self {
            inner: Mutex::new(Inner {
                state: StepState::new(ctx.stock_movement_id.clone()),
                busy: Vec::new(),
                submissions: 0,
                loaded: false,
                handed_off: false,
            }),
            ctx,
            store,
            host,
            schema: packing_schema(),
            next_status: stockflow_protocol::PACKING_NEXT_STATUS.to_string(),
            submit_policy: SubmitPolicy::default(),
            sequence: RequestSequence::new(),
            phase_tx,
        }
    }

    pub fn from_config(
        config: &WizardConfig,
        stock_movement_id: impl Into<String>,
        store: Arc<dyn RemoteStepStore>,
        host: Arc<dyn WizardHost>,
    ) -> Self {
        let ctx = StepContext::new(stock_movement_id, config.step_number);
        Self::new(ctx, store, host)
            .with_next_status(config.next_status.clone())
            .with_submit_policy(config.submit_policy)
    }

    pub fn with_schema(mut self, schema: &'static FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_next_status(mut self, status: impl Into<String>) -> Self {
        self.next_status = status.into();
        self
    }

    pub fn with_submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    pub fn context(&self) -> &StepContext {
        &self.ctx
    }

    pub fn schema(&self) -> &'static FieldSchema {
        self.schema
    }

    pub fn phase(&self) -> StepPhase {
        self.lock().phase()
    }

    /// Phase updates, starting with the current phase.
    pub fn subscribe(&self) -> watch::Receiver<StepPhase> {
        self.phase_tx.subscribe()
    }

    /// Snapshot of the current form values.
    pub fn values(&self) -> StepState {
        self.lock().state.clone()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_items(self.schema, &self.lock().state.items)
    }

    /// True when Save/Next would be blocked by required-field checks.
    pub fn is_invalid(&self) -> bool {
        self.validate().is_err()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Remote operations
    // ─────────────────────────────────────────────────────────────────────

    /// Load the step's items. On failure the previous items stay in place.
    pub async fn initialize(&self) -> Result<(), StepError> {
        let busy = self.begin(StepPhase::Loading, false)?;
        match self.store.fetch(&self.ctx).await {
            Ok(items) => {
                let count = items.len();
                if self.commit(busy.ticket, items) {
                    tracing::info!(
                        stock_movement_id = %self.ctx.stock_movement_id,
                        count,
                        "loaded step items"
                    );
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    stock_movement_id = %self.ctx.stock_movement_id,
                    "failed to load step items: {err}"
                );
                Err(err.into())
            }
        }
    }

    /// Persist `values` and adopt the server's canonical items.
    pub async fn save(&self, values: StepState) -> Result<Notice, StepError> {
        self.ensure_active()?;
        validate_items(self.schema, &values.items)?;

        let busy = self.begin(StepPhase::Saving, true)?;
        let notice = self
            .persist(busy.ticket, values.items)
            .await
            .inspect_err(|err| tracing::warn!("save failed: {err}"))?;
        Ok(notice)
    }

    /// Save the controller's own current values.
    pub async fn save_current(&self) -> Result<Notice, StepError> {
        self.save(self.values()).await
    }

    /// Re-fetch after the user confirms; unsaved edits are discarded.
    pub async fn refresh(&self) -> Result<RefreshOutcome, StepError> {
        self.ensure_active()?;
        if !self.host.confirm(&ConfirmPrompt::refresh()).await {
            tracing::debug!("refresh declined");
            return Ok(RefreshOutcome::Declined);
        }
        self.initialize().await?;
        Ok(RefreshOutcome::Refreshed)
    }

    /// Save, move the stock movement to the next status, then hand `values`
    /// to the parent wizard.
    ///
    /// If the save succeeds but the status change fails, the saved items are
    /// kept locally and the wizard does not advance; calling `advance` again
    /// is safe.
    pub async fn advance(&self, values: StepState) -> Result<(), StepError> {
        self.ensure_active()?;
        validate_items(self.schema, &values.items)?;

        let busy = self.begin(StepPhase::Advancing, true)?;
        self.persist(busy.ticket, values.items.clone())
            .await
            .inspect_err(|err| tracing::warn!("advance aborted, save failed: {err}"))?;
        self.store
            .transition_status(&self.ctx, &self.next_status)
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    status = %self.next_status,
                    "advance aborted, status transition failed: {err}"
                );
            })?;

        self.host.on_submit(values).await;
        self.lock().handed_off = true;
        tracing::info!(
            stock_movement_id = %self.ctx.stock_movement_id,
            status = %self.next_status,
            "step handed off"
        );
        drop(busy);
        Ok(())
    }

    /// Navigate back without saving.
    pub async fn go_to_previous_step(&self, values: StepState) -> Result<(), StepError> {
        self.ensure_active()?;
        self.host.previous_page(values).await;
        Ok(())
    }

    /// Replace the split sub-items of row `line_index` and save right away.
    ///
    /// Required fields are not checked: a split is committed even while the
    /// rest of the form is incomplete.
    pub async fn save_split_lines(
        &self,
        values: StepState,
        line_index: usize,
        split_items: Vec<LineItem>,
    ) -> Result<(), StepError> {
        self.ensure_active()?;
        let items = apply_split(&values.items, line_index, split_items)?;

        let busy = self.begin(StepPhase::Saving, true)?;
        self.persist(busy.ticket, items)
            .await
            .inspect_err(|err| tracing::warn!(line_index, "split save failed: {err}"))?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Local edits
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_recipient(&self, row: usize, recipient: Option<UserRef>) -> Result<(), StepError> {
        self.edit_row(row, |item| item.recipient = recipient)
    }

    pub fn set_pallet_name(&self, row: usize, name: Option<String>) -> Result<(), StepError> {
        self.edit_row(row, |item| item.pallet_name = name)
    }

    pub fn set_box_name(&self, row: usize, name: Option<String>) -> Result<(), StepError> {
        self.edit_row(row, |item| item.box_name = name)
    }

    /// Arbitrary edit of the item collection. Rejected, and not applied, if
    /// it leaves two items with the same id.
    pub fn edit_items<R>(&self, f: impl FnOnce(&mut Vec<LineItem>) -> R) -> Result<R, StepError> {
        let mut inner = self.lock();
        if inner.handed_off {
            return Err(StepError::HandedOff);
        }
        let mut items = inner.state.items.clone();
        let result = f(&mut items);
        StepState::check_unique_ids(&items).map_err(StepError::DuplicateLine)?;
        inner.state.items = items;
        Ok(result)
    }

    fn edit_row(&self, row: usize, f: impl FnOnce(&mut LineItem)) -> Result<(), StepError> {
        let mut inner = self.lock();
        if inner.handed_off {
            return Err(StepError::HandedOff);
        }
        let item = inner
            .state
            .items
            .get_mut(row)
            .ok_or(StepError::NoSuchLine(row))?;
        f(item);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent even if a holder panicked: every write is a
        // single assignment.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.phase_tx.send_replace(inner.phase());
    }

    fn ensure_active(&self) -> Result<(), StepError> {
        if self.lock().handed_off {
            Err(StepError::HandedOff)
        } else {
            Ok(())
        }
    }

    /// Enter a busy phase and take a request ticket.
    fn begin(&self, phase: StepPhase, submission: bool) -> Result<BusyGuard<'_>, StepError> {
        let mut inner = self.lock();
        if inner.handed_off {
            return Err(StepError::HandedOff);
        }
        if submission {
            if self.submit_policy == SubmitPolicy::Reject && inner.submissions > 0 {
                tracing::debug!(?phase, "submission rejected, another one is in flight");
                return Err(StepError::Busy);
            }
            inner.submissions += 1;
        }
        let ticket = self.sequence.next_seq();
        inner.busy.push((ticket, phase));
        self.publish(&inner);
        tracing::debug!(?phase, ticket, "step busy");
        Ok(BusyGuard {
            controller: self,
            ticket,
            submission,
        })
    }

    /// Replace local items with a response, unless a newer one already did.
    fn commit(&self, ticket: u64, items: Vec<LineItem>) -> bool {
        let mut inner = self.lock();
        if !self.sequence.try_commit(ticket) {
            tracing::debug!(
                ticket,
                committed = self.sequence.committed_seq(),
                "dropping stale response"
            );
            return false;
        }
        inner.state.items = items;
        true
    }

    async fn persist(&self, ticket: u64, items: Vec<LineItem>) -> Result<Notice, StoreError> {
        if items.is_empty() {
            tracing::debug!("no line items, nothing to save");
            return Ok(Notice::NothingToSave);
        }
        let count = items.len();
        match self.store.save(&self.ctx, items).await? {
            Some(canonical) => {
                if self.commit(ticket, canonical) {
                    tracing::info!(
                        stock_movement_id = %self.ctx.stock_movement_id,
                        count,
                        "saved step items"
                    );
                }
                Ok(Notice::Saved)
            }
            None => Ok(Notice::NothingToSave),
        }
    }
}

/// Leaves the busy phase when dropped, including when the operation's
/// future is dropped mid-flight.
struct BusyGuard<'a> {
    controller: &'a StepController,
    ticket: u64,
    submission: bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.lock();
        inner.busy.retain(|(ticket, _)| *ticket != self.ticket);
        inner.loaded = true;
        if self.submission {
            inner.submissions = inner.submissions.saturating_sub(1);
        }
        self.controller.publish(&inner);
    }
}
