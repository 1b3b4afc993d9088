use crate::{Effect, Msg, PagePhase, SearchState, TriggerKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SearchState, msg: Msg) -> (SearchState, Vec<Effect>) {
    // An unloading or stranded page reacts to nothing but the navigation outcome.
    let outcome = matches!(
        msg,
        Msg::PageReloaded | Msg::NavigationFailed { .. } | Msg::NoOp
    );
    if state.phase() != PagePhase::Interactive && !outcome {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::TextInput { field, value } => {
            state.form_mut().set_text(&field, &value);
            state.mark_dirty();
            schedule_if_trigger(&mut state, &field, TriggerKind::TextInput)
        }
        Msg::CheckboxClicked {
            field,
            value,
            checked,
        } => {
            state.form_mut().set_checkbox(&field, &value, checked);
            state.mark_dirty();
            schedule_if_trigger(&mut state, &field, TriggerKind::CheckboxClick)
        }
        Msg::QuietPeriodElapsed(ticket) => {
            if !state.take_pending(ticket) {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(3);
            if state.profile().clears_errors() {
                effects.push(Effect::ClearErrors);
            }
            effects.push(Effect::ShowLoading);
            let request_id = state.begin_request();
            effects.push(Effect::Post {
                request_id,
                endpoint: state.form().ajax_endpoint(),
                body: state.form().serialize(),
            });
            effects
        }
        Msg::SubmissionSucceeded { request_id, markup } => {
            if !state.finish_request(request_id) {
                return (state, Vec::new());
            }
            // Responses land in arrival order; a slow earlier request may
            // overwrite a faster later one.
            state.record_fragment_applied();
            vec![
                Effect::ApplyFragment { request_id, markup },
                Effect::HideLoading,
            ]
        }
        Msg::SubmissionFailed { request_id, .. } => {
            if !state.finish_request(request_id) {
                return (state, Vec::new());
            }
            let had_pending = state.begin_navigation();
            let mut effects = Vec::with_capacity(2);
            if had_pending {
                effects.push(Effect::CancelSubmit);
            }
            effects.push(Effect::NativeSubmit {
                form: state.form().clone(),
            });
            effects
        }
        Msg::PageReloaded => {
            if state.phase() != PagePhase::Interactive {
                state.reload();
            }
            Vec::new()
        }
        Msg::NavigationFailed { .. } => {
            if state.phase() != PagePhase::Navigating {
                return (state, Vec::new());
            }
            state.strand();
            vec![Effect::HideLoading]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn schedule_if_trigger(state: &mut SearchState, field: &str, kind: TriggerKind) -> Vec<Effect> {
    if !state.profile().is_trigger(field, kind) {
        return Vec::new();
    }
    let ticket = state.issue_ticket();
    vec![Effect::ScheduleSubmit {
        ticket,
        delay: state.profile().quiet_period.as_duration(),
    }]
}
