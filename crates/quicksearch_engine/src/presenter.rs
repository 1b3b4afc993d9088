use quicksearch_core::{
    ErrorConvention, LoadingStyle, PageLayout, SearchProfile, StatusUpdateStrategy,
};
use quicksearch_logging::search_debug;

use crate::fragment::find_marked_inner_html;
use crate::page::PageDom;

/// Applies loading, error and fragment updates to the injected page regions.
#[derive(Debug, Clone)]
pub struct Presenter {
    layout: PageLayout,
    loading_style: LoadingStyle,
    status_update: StatusUpdateStrategy,
    errors: Option<ErrorConvention>,
}

impl Presenter {
    pub fn new(
        layout: PageLayout,
        loading_style: LoadingStyle,
        status_update: StatusUpdateStrategy,
        errors: Option<ErrorConvention>,
    ) -> Self {
        Self {
            layout,
            loading_style,
            status_update,
            errors,
        }
    }

    pub fn from_profile(profile: &SearchProfile) -> Self {
        Self::new(
            profile.layout.clone(),
            profile.loading_style,
            profile.status_update.clone(),
            profile.errors.clone(),
        )
    }

    pub fn toggle_loading(&self, page: &mut dyn PageDom, show: bool) {
        if show {
            self.show_loading(page);
        } else {
            self.hide_loading(page);
        }
    }

    pub fn show_loading(&self, page: &mut dyn PageDom) {
        let layout = &self.layout;
        let found = match self.loading_style {
            LoadingStyle::Fade => page.set_style(&layout.content_id, "opacity", "0"),
            LoadingStyle::Empty => page.set_inner_html(&layout.content_id, ""),
        };
        if !found {
            search_debug!("content region #{} not on page", layout.content_id);
        }
        page.add_class(&layout.container_id, &layout.loading_class);
    }

    pub fn hide_loading(&self, page: &mut dyn PageDom) {
        let layout = &self.layout;
        page.remove_class(&layout.container_id, &layout.loading_class);
        if self.loading_style == LoadingStyle::Fade {
            page.set_style(&layout.content_id, "opacity", "1");
        }
    }

    /// Removes rendered validation errors and the error prefix from the
    /// title. Does nothing for layouts without an error convention.
    pub fn clear_errors(&self, page: &mut dyn PageDom) {
        let Some(errors) = &self.errors else {
            return;
        };
        let removed = page.remove_with_class(&errors.summary_class)
            + page.remove_with_class(&errors.message_class);
        let stripped = page.strip_class(&errors.group_error_class);
        if let Some(title) = errors.restore_title(&page.title()) {
            page.set_title(&title);
        }
        search_debug!(
            "cleared errors: removed={} groups_restored={}",
            removed,
            stripped
        );
    }

    /// Splices a response fragment into the content region and updates the
    /// status region. Returns whether the status region changed.
    pub fn apply_fragment(&self, page: &mut dyn PageDom, markup: &str) -> bool {
        let layout = &self.layout;
        match &self.status_update {
            StatusUpdateStrategy::CopyFragment { marker_id } => {
                let status = find_marked_inner_html(markup, marker_id);
                let status_updated = match status.as_deref() {
                    Some(status) => page.set_inner_html(&layout.status_id, status),
                    None => {
                        search_debug!("fragment has no #{}; status left as is", marker_id);
                        false
                    }
                };
                page.set_inner_html(&layout.content_id, markup);
                status_updated
            }
            StatusUpdateStrategy::AriaRole { role } => {
                page.set_inner_html(&layout.content_id, markup);
                page.set_attribute(&layout.status_id, "role", role)
            }
        }
    }
}
