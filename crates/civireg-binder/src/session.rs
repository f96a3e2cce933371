// SPDX-License-Identifier: Apache-2.0

use crate::timer::{DebounceTimer, TimerToken};
use crate::ResidentLookup;
use civireg_core::RegistryError;
use civireg_model::{RequesterFields, Resident, ResidentId};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Observed quiet period of the original forms.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BinderPhase {
    Unbound,
    SearchActive,
    Resolving,
    Bound,
}

/// One per ticket edit form. The session is driven cooperatively: callers
/// arm a phase change (`input_search`, `select_result`) and then await the
/// matching `settle_*` with the returned token. A settle whose token was
/// superseded resolves to `Ok(None)` and applies nothing, so a late
/// response can never overwrite newer input.
pub struct BinderSession {
    lookup: Arc<dyn ResidentLookup>,
    timer: DebounceTimer,
    phase: BinderPhase,
    resident_id: Option<ResidentId>,
    fields: RequesterFields,
    search_term: String,
    pending_selection: Option<ResidentId>,
}

impl BinderSession {
    #[must_use]
    pub fn new(lookup: Arc<dyn ResidentLookup>) -> Self {
        Self::with_quiet_period(lookup, DEFAULT_QUIET_PERIOD)
    }

    #[must_use]
    pub fn with_quiet_period(lookup: Arc<dyn ResidentLookup>, quiet: Duration) -> Self {
        Self {
            lookup,
            timer: DebounceTimer::new(quiet),
            phase: BinderPhase::Unbound,
            resident_id: None,
            fields: RequesterFields::default(),
            search_term: String::new(),
            pending_selection: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> BinderPhase {
        self.phase
    }

    #[must_use]
    pub const fn resident_id(&self) -> Option<&ResidentId> {
        self.resident_id.as_ref()
    }

    #[must_use]
    pub const fn fields(&self) -> &RequesterFields {
        &self.fields
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.resident_id.is_some()
    }

    /// Flips the "I am a registered resident" flag. Flipping in either
    /// direction is a deliberate reset: the binding and all four derived
    /// fields are cleared in this single call, with no intermediate state
    /// an observer could see. Setting the current value again is a no-op.
    pub fn set_registered(&mut self, registered: bool) {
        match (self.phase, registered) {
            (BinderPhase::Unbound, true) => {
                self.clear_binding();
                self.phase = BinderPhase::SearchActive;
            }
            (BinderPhase::Unbound, false) => {}
            (_, false) => {
                self.clear_binding();
                self.phase = BinderPhase::Unbound;
                debug!("binder session unbound");
            }
            (_, true) => {}
        }
    }

    /// Manual entry of the four requester fields. Rejected while bound:
    /// the values are system-sourced as long as `resident_id` is set.
    pub fn edit_fields(&mut self, fields: RequesterFields) -> Result<(), RegistryError> {
        if self.is_bound() {
            return Err(RegistryError::validation(
                "requester fields are populated from the bound resident; unbind to edit them",
            ));
        }
        self.fields = fields;
        Ok(())
    }

    /// Records new search text and restarts the quiet period. Starting a
    /// new search from Bound drops the binding first.
    pub fn input_search(&mut self, term: &str) -> Result<TimerToken, RegistryError> {
        if self.phase == BinderPhase::Unbound {
            return Err(RegistryError::validation(
                "resident search requires the registered-resident flag",
            ));
        }
        if self.phase == BinderPhase::Bound {
            self.clear_binding();
        }
        self.phase = BinderPhase::SearchActive;
        self.pending_selection = None;
        self.search_term = term.to_string();
        Ok(self.timer.arm())
    }

    /// Waits out the quiet period behind `token` and runs the directory
    /// search. Returns `Ok(None)` without searching when the token was
    /// superseded by newer input or cancelled.
    pub async fn settle_search(
        &mut self,
        token: TimerToken,
    ) -> Result<Option<Vec<Resident>>, RegistryError> {
        let Some(deadline) = self.timer.deadline(token) else {
            return Ok(None);
        };
        tokio::time::sleep_until(deadline).await;
        if !self.timer.is_current(token) {
            return Ok(None);
        }
        let results = self.lookup.search(&self.search_term).await?;
        debug!(term = %self.search_term, hits = results.len(), "binder search settled");
        Ok(Some(results))
    }

    /// A search result was clicked; schedules the resolve fetch behind the
    /// same settling delay.
    pub fn select_result(&mut self, id: ResidentId) -> Result<TimerToken, RegistryError> {
        if !matches!(self.phase, BinderPhase::SearchActive | BinderPhase::Resolving) {
            return Err(RegistryError::validation(
                "selecting a resident requires an active search",
            ));
        }
        self.phase = BinderPhase::Resolving;
        self.pending_selection = Some(id);
        Ok(self.timer.arm())
    }

    /// Completes a pending selection: fetches the resident and copies the
    /// four fields verbatim. On lookup failure the session returns to
    /// SearchActive with the fields untouched and surfaces the error; it
    /// never ends up Bound behind a reference that failed to resolve.
    pub async fn settle_resolve(
        &mut self,
        token: TimerToken,
    ) -> Result<Option<&RequesterFields>, RegistryError> {
        let Some(deadline) = self.timer.deadline(token) else {
            return Ok(None);
        };
        tokio::time::sleep_until(deadline).await;
        if !self.timer.is_current(token) || self.phase != BinderPhase::Resolving {
            return Ok(None);
        }
        let Some(id) = self.pending_selection.clone() else {
            return Ok(None);
        };
        match self.lookup.get_by_id(&id).await {
            Ok(resident) => {
                self.fields = RequesterFields::from_resident(&resident);
                self.resident_id = Some(resident.id);
                self.pending_selection = None;
                self.phase = BinderPhase::Bound;
                debug!(resident_id = %id, "binder session bound");
                Ok(Some(&self.fields))
            }
            Err(err) => {
                self.pending_selection = None;
                self.phase = BinderPhase::SearchActive;
                Err(err)
            }
        }
    }

    fn clear_binding(&mut self) {
        self.timer.cancel();
        self.resident_id = None;
        self.pending_selection = None;
        self.fields = RequesterFields::default();
        self.search_term.clear();
    }
}
