use std::collections::BTreeSet;

use crate::view_model::SearchViewModel;
use crate::{SearchForm, SearchProfile, TimerTicket};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagePhase {
    /// The page accepts input and applies fragments in place.
    #[default]
    Interactive,
    /// A native submission is under way; the page is being replaced.
    Navigating,
    /// The native submission failed. Nothing is pending and input is ignored.
    Stranded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    profile: SearchProfile,
    form: SearchForm,
    phase: PagePhase,
    pending: Option<TimerTicket>,
    next_ticket: u64,
    next_request_id: RequestId,
    in_flight: BTreeSet<RequestId>,
    loading: bool,
    submissions: u64,
    fragments_applied: u64,
    fallbacks: u64,
    dirty: bool,
}

impl SearchState {
    pub fn new(profile: SearchProfile, form: SearchForm) -> Self {
        Self {
            profile,
            form,
            phase: PagePhase::default(),
            pending: None,
            next_ticket: 1,
            next_request_id: 1,
            in_flight: BTreeSet::new(),
            loading: false,
            submissions: 0,
            fragments_applied: 0,
            fallbacks: 0,
            dirty: false,
        }
    }

    pub fn profile(&self) -> &SearchProfile {
        &self.profile
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn pending_ticket(&self) -> Option<TimerTicket> {
        self.pending
    }

    pub fn view(&self) -> SearchViewModel {
        SearchViewModel {
            phase: self.phase,
            loading: self.loading,
            pending_ticket: self.pending,
            in_flight: self.in_flight.iter().copied().collect(),
            submissions: self.submissions,
            fragments_applied: self.fragments_applied,
            fallbacks: self.fallbacks,
            query: self.form.serialize(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn form_mut(&mut self) -> &mut SearchForm {
        &mut self.form
    }

    /// Supersedes any pending ticket with a fresh one.
    pub(crate) fn issue_ticket(&mut self) -> TimerTicket {
        let ticket = TimerTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);
        ticket
    }

    /// Consumes the pending ticket if `ticket` is the current one.
    pub(crate) fn take_pending(&mut self, ticket: TimerTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn begin_request(&mut self) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight.insert(request_id);
        self.submissions += 1;
        self.loading = true;
        self.dirty = true;
        request_id
    }

    /// Removes `request_id` from the in-flight set; `false` for unknown ids.
    pub(crate) fn finish_request(&mut self, request_id: RequestId) -> bool {
        self.in_flight.remove(&request_id)
    }

    pub(crate) fn record_fragment_applied(&mut self) {
        self.fragments_applied += 1;
        self.loading = false;
        self.dirty = true;
    }

    /// Enters the navigating phase; returns whether a timer was pending.
    pub(crate) fn begin_navigation(&mut self) -> bool {
        self.phase = PagePhase::Navigating;
        self.fallbacks += 1;
        self.dirty = true;
        self.pending.take().is_some()
    }

    pub(crate) fn strand(&mut self) {
        self.phase = PagePhase::Stranded;
        self.pending = None;
        self.in_flight.clear();
        self.loading = false;
        self.dirty = true;
    }

    pub(crate) fn reload(&mut self) {
        self.phase = PagePhase::Interactive;
        self.pending = None;
        self.in_flight.clear();
        self.loading = false;
        self.dirty = true;
    }
}
