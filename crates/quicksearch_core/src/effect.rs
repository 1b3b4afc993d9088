use std::time::Duration;

use crate::{RequestId, SearchForm, TimerTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace any pending submit timer with one firing after `delay`.
    ScheduleSubmit { ticket: TimerTicket, delay: Duration },
    /// Drop the pending submit timer without firing it.
    CancelSubmit,
    ClearErrors,
    ShowLoading,
    /// POST the serialized form to the fragment endpoint.
    Post {
        request_id: RequestId,
        endpoint: String,
        body: String,
    },
    /// Splice the response fragment into the page and update the status region.
    ApplyFragment { request_id: RequestId, markup: String },
    HideLoading,
    /// Submit the form the plain way, navigating away from the current page.
    NativeSubmit { form: SearchForm },
}
