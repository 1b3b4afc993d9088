use crate::{PagePhase, RequestId, TimerTicket};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchViewModel {
    pub phase: PagePhase,
    pub loading: bool,
    pub pending_ticket: Option<TimerTicket>,
    pub in_flight: Vec<RequestId>,
    pub submissions: u64,
    pub fragments_applied: u64,
    pub fallbacks: u64,
    pub query: String,
    pub dirty: bool,
}
