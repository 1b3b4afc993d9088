//! Quicksearch core: pure search-form state machine and view-model helpers.
mod debounce;
mod effect;
mod form;
mod msg;
mod profile;
mod state;
mod update;
mod view_model;

pub use debounce::{QuietPeriod, SettingsError, TimerTicket, DEFAULT_QUIET_PERIOD_MS};
pub use effect::Effect;
pub use form::{FormMethod, NativeRequest, SearchForm, AJAX_SUFFIX};
pub use msg::Msg;
pub use profile::{
    ErrorConvention, LoadingStyle, PageLayout, SearchProfile, StatusUpdateStrategy, Trigger,
    TriggerKind,
};
pub use state::{PagePhase, RequestId, SearchState};
pub use update::update;
pub use view_model::SearchViewModel;
