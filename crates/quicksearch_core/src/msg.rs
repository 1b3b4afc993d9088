use crate::{RequestId, TimerTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited a text control.
    TextInput { field: String, value: String },
    /// User clicked a checkbox.
    CheckboxClicked {
        field: String,
        value: String,
        checked: bool,
    },
    /// A scheduled submit timer fired.
    QuietPeriodElapsed(TimerTicket),
    /// The fragment endpoint answered with markup.
    SubmissionSucceeded { request_id: RequestId, markup: String },
    /// The fragment request failed for any reason.
    SubmissionFailed { request_id: RequestId, reason: String },
    /// A fresh page replaced the one that fell back to native submission.
    PageReloaded,
    /// The native submission itself failed; the old page stays up.
    NavigationFailed { reason: String },
    /// Fallback for placeholder wiring.
    NoOp,
}
