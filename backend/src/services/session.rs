//! Interactive analytics session.
//!
//! Holds the cached expansion of the loaded table, the current filter state
//! and the last report that was computed successfully. Every filter change
//! triggers a full recomputation; a failed pass leaves the previous state and
//! report untouched.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::expansion::Expansion;
use super::report::{compute_report, filter_options, AnalyticsReport, FilterOptions};
use crate::error::{ProcessingError, ProcessingResult};
use crate::models::{Dataset, FilterState};

/// Run one recomputation, turning a panic into [`ProcessingError::Unexpected`].
pub fn guarded<T>(f: impl FnOnce() -> ProcessingResult<T>) -> ProcessingResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let err = ProcessingError::from_panic(payload);
        log::error!("{}", err);
        Err(err)
    })
}

pub struct AnalyticsSession {
    expansion: Arc<Expansion>,
    state: FilterState,
    report: AnalyticsReport,
}

impl AnalyticsSession {
    /// Start a session on `dataset` with the default filter state.
    pub fn new(dataset: Dataset) -> ProcessingResult<Self> {
        Self::with_state(Arc::new(Expansion::from(dataset)), FilterState::new())
    }

    /// Start a session on an already expanded dataset.
    pub fn with_state(expansion: Arc<Expansion>, state: FilterState) -> ProcessingResult<Self> {
        let report = guarded(|| compute_report(&expansion, &state))?;
        Ok(Self {
            expansion,
            state,
            report,
        })
    }

    pub fn expansion(&self) -> &Arc<Expansion> {
        &self.expansion
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Last successfully computed report.
    pub fn report(&self) -> &AnalyticsReport {
        &self.report
    }

    pub fn options(&self) -> FilterOptions {
        filter_options(&self.expansion, &self.state)
    }

    /// Replace the loaded table.
    ///
    /// The expansion is rebuilt; selections are cleared since they refer to
    /// the old table's values, while the toggle and mode carry over.
    pub fn load(&mut self, dataset: Dataset) -> ProcessingResult<&AnalyticsReport> {
        let expansion = Arc::new(Expansion::from(dataset));
        let state = FilterState {
            selections: Default::default(),
            ..self.state.clone()
        };
        let report = guarded(|| compute_report(&expansion, &state))?;

        self.expansion = expansion;
        self.state = state;
        self.report = report;
        Ok(&self.report)
    }

    /// Apply a new filter state and recompute every output.
    ///
    /// On failure the previous state and report stay in place.
    pub fn apply_filter(&mut self, state: FilterState) -> ProcessingResult<&AnalyticsReport> {
        let expansion = Arc::clone(&self.expansion);
        let report = guarded(|| compute_report(&expansion, &state)).map_err(|err| {
            log::warn!("Filter change rejected, keeping previous report: {}", err);
            err
        })?;

        self.state = state;
        self.report = report;
        Ok(&self.report)
    }

    /// Convenience wrapper that edits a copy of the current state.
    pub fn update_filter(
        &mut self,
        edit: impl FnOnce(FilterState) -> FilterState,
    ) -> ProcessingResult<&AnalyticsReport> {
        let next = edit(self.state.clone());
        self.apply_filter(next)
    }
}
