//! Page layout and per-form behavior switches.
//!
//! The two shipped profiles differ only in data: which controls trigger a
//! search, how the loading state is drawn, how the result count is announced
//! and whether validation errors are cleared before a new submission.

use crate::QuietPeriod;

/// Region ids the presenter writes to. Injected, never looked up globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    /// Wrapper that receives the loading class.
    pub container_id: String,
    /// Region whose markup is replaced by the response fragment.
    pub content_id: String,
    /// Result count / status region.
    pub status_id: String,
    pub loading_class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingStyle {
    /// Remove the content markup while loading.
    Empty,
    /// Keep the markup but render it at zero opacity.
    #[default]
    Fade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdateStrategy {
    /// Copy the inner markup of the fragment element with `marker_id` into the
    /// status region.
    CopyFragment { marker_id: String },
    /// Mark the status region with an ARIA `role` after the swap.
    AriaRole { role: String },
}

/// Markup convention for server-rendered validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorConvention {
    pub summary_class: String,
    pub message_class: String,
    pub group_error_class: String,
    /// Separator in titles decorated as `"<prefix>: <title>"`.
    pub title_separator: String,
}

impl Default for ErrorConvention {
    fn default() -> Self {
        Self {
            summary_class: "govuk-error-summary".to_string(),
            message_class: "govuk-error-message".to_string(),
            group_error_class: "govuk-form-group--error".to_string(),
            title_separator: ": ".to_string(),
        }
    }
}

impl ErrorConvention {
    /// Undecorated title, or `None` when the title carries no error prefix.
    ///
    /// Keeps only the segment between the first and second separator.
    pub fn restore_title(&self, title: &str) -> Option<String> {
        if self.title_separator.is_empty() {
            return None;
        }
        let mut segments = title.split(self.title_separator.as_str());
        segments.next();
        segments.next().map(str::to_owned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    TextInput,
    CheckboxClick,
}

/// A control whose events restart the debounce timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub field: String,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn text(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: TriggerKind::TextInput,
        }
    }

    pub fn checkbox(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: TriggerKind::CheckboxClick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProfile {
    pub name: String,
    pub quiet_period: QuietPeriod,
    pub triggers: Vec<Trigger>,
    pub layout: PageLayout,
    pub loading_style: LoadingStyle,
    pub status_update: StatusUpdateStrategy,
    /// `Some` when the form renders server-side validation errors.
    pub errors: Option<ErrorConvention>,
}

impl SearchProfile {
    /// Glossary search: two text inputs, count region announced via `role`.
    pub fn glossary() -> Self {
        Self {
            name: "glossary".to_string(),
            quiet_period: QuietPeriod::default(),
            triggers: vec![Trigger::text("searchTerm"), Trigger::text("sortTerm")],
            layout: PageLayout {
                container_id: "glossary-list-container".to_string(),
                content_id: "glossary-list-content".to_string(),
                status_id: "glossary-result-count".to_string(),
                loading_class: "loading".to_string(),
            },
            loading_style: LoadingStyle::Fade,
            status_update: StatusUpdateStrategy::AriaRole {
                role: "status".to_string(),
            },
            errors: None,
        }
    }

    /// Software vendor search: text input plus filter checkboxes, count copied
    /// out of the fragment, validation errors cleared on each submission.
    pub fn vendor() -> Self {
        Self {
            name: "vendor".to_string(),
            quiet_period: QuietPeriod::default(),
            triggers: vec![Trigger::text("searchTerm"), Trigger::checkbox("*")],
            layout: PageLayout {
                container_id: "software-vendors".to_string(),
                content_id: "software-vendor-list".to_string(),
                status_id: "vendor-count".to_string(),
                loading_class: "loading".to_string(),
            },
            loading_style: LoadingStyle::Fade,
            status_update: StatusUpdateStrategy::CopyFragment {
                marker_id: "updated-vendor-count".to_string(),
            },
            errors: Some(ErrorConvention::default()),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "glossary" => Some(Self::glossary()),
            "vendor" => Some(Self::vendor()),
            _ => None,
        }
    }

    /// Whether an event of `kind` on `field` restarts the debounce timer.
    /// A trigger field of `*` matches every control of that kind.
    pub fn is_trigger(&self, field: &str, kind: TriggerKind) -> bool {
        self.triggers
            .iter()
            .any(|trigger| trigger.kind == kind && (trigger.field == "*" || trigger.field == field))
    }

    pub fn clears_errors(&self) -> bool {
        self.errors.is_some()
    }
}
