use scraper::{ElementRef, Html};

/// Inner markup of the element with `marker_id` inside a response fragment.
///
/// Only descendants of the fragment's top-level elements are searched: a
/// top-level element carrying the marker is not a match. A missing marker
/// yields `None`.
pub fn find_marked_inner_html(markup: &str, marker_id: &str) -> Option<String> {
    let fragment = Html::parse_fragment(markup);
    let inner = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find_map(|top_level| {
            top_level
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .find(|element| element.value().id() == Some(marker_id))
        })
        .map(|element| element.inner_html());
    inner
}
