use url::form_urlencoded;

/// Suffix appended to the form action to reach the fragment endpoint.
pub const AJAX_SUFFIX: &str = "/ajax";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

/// Request issued when the browser submits the form itself (full navigation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRequest {
    pub method: FormMethod,
    pub url: String,
    pub body: Option<String>,
}

/// Snapshot of a search form: its action, method and successful controls in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchForm {
    action: String,
    method: FormMethod,
    fields: Vec<(String, String)>,
}

impl SearchForm {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method: FormMethod::default(),
            fields: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: FormMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method(&self) -> FormMethod {
        self.method
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value submitted under `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values submitted under `name`, in document order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text controls are single-valued: the first `name` entry is overwritten
    /// in place (or appended) and any later duplicates are dropped.
    pub fn set_text(&mut self, name: &str, value: &str) {
        let mut seen = false;
        self.fields.retain_mut(|(field, current)| {
            if field.as_str() != name {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            value.clone_into(current);
            true
        });
        if !seen {
            self.fields.push((name.to_owned(), value.to_owned()));
        }
    }

    /// Checkbox groups are multi-valued: a checked box contributes its
    /// `(name, value)` pair once, an unchecked box contributes nothing.
    pub fn set_checkbox(&mut self, name: &str, value: &str, checked: bool) {
        let present = self
            .fields
            .iter()
            .any(|(field, current)| field == name && current == value);
        if checked && !present {
            self.fields.push((name.to_owned(), value.to_owned()));
        } else if !checked && present {
            self.fields
                .retain(|(field, current)| !(field == name && current == value));
        }
    }

    /// `application/x-www-form-urlencoded` body of all fields.
    pub fn serialize(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }

    /// Endpoint for the in-place update: the action with `/ajax` appended.
    pub fn ajax_endpoint(&self) -> String {
        format!("{}{}", self.action, AJAX_SUFFIX)
    }

    /// Request a browser would issue for a plain submission of this form.
    ///
    /// GET replaces any query on the action with the serialized fields; POST
    /// sends them as the body.
    pub fn native_request(&self) -> NativeRequest {
        match self.method {
            FormMethod::Get => {
                let without_fragment = self.action.split('#').next().unwrap_or_default();
                let base = without_fragment.split('?').next().unwrap_or_default();
                NativeRequest {
                    method: FormMethod::Get,
                    url: format!("{base}?{}", self.serialize()),
                    body: None,
                }
            }
            FormMethod::Post => NativeRequest {
                method: FormMethod::Post,
                url: self.action.clone(),
                body: Some(self.serialize()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_in_document_order_with_plus_for_spaces() {
        let form = SearchForm::new("/search")
            .with_field("searchTerm", "foo bar")
            .with_field("sortTerm", "a&z");
        assert_eq!(form.serialize(), "searchTerm=foo+bar&sortTerm=a%26z");
    }

    #[test]
    fn ajax_endpoint_appends_suffix_literally() {
        assert_eq!(SearchForm::new("/search").ajax_endpoint(), "/search/ajax");
        assert_eq!(
            SearchForm::new("https://example.com/software").ajax_endpoint(),
            "https://example.com/software/ajax"
        );
    }

    #[test]
    fn set_text_overwrites_first_and_drops_duplicates() {
        let mut form = SearchForm::new("/search")
            .with_field("searchTerm", "a")
            .with_field("page", "2")
            .with_field("searchTerm", "b");
        form.set_text("searchTerm", "foo");
        assert_eq!(
            form.fields(),
            &[
                ("searchTerm".to_string(), "foo".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );

        form.set_text("sortTerm", "name");
        assert_eq!(form.value("sortTerm"), Some("name"));
    }

    #[test]
    fn checkbox_pairs_are_added_once_and_removed() {
        let mut form = SearchForm::new("/software");
        form.set_checkbox("category", "hosting", true);
        form.set_checkbox("category", "hosting", true);
        form.set_checkbox("category", "support", true);
        assert_eq!(
            form.values("category").collect::<Vec<_>>(),
            vec!["hosting", "support"]
        );

        form.set_checkbox("category", "hosting", false);
        assert_eq!(form.serialize(), "category=support");
    }

    #[test]
    fn native_get_replaces_action_query() {
        let form = SearchForm::new("/search?old=1#top").with_field("searchTerm", "foo");
        let request = form.native_request();
        assert_eq!(request.method, FormMethod::Get);
        assert_eq!(request.url, "/search?searchTerm=foo");
        assert_eq!(request.body, None);
    }

    #[test]
    fn native_post_sends_body_to_action() {
        let form = SearchForm::new("/search")
            .with_method(FormMethod::Post)
            .with_field("searchTerm", "foo");
        let request = form.native_request();
        assert_eq!(request.url, "/search");
        assert_eq!(request.body.as_deref(), Some("searchTerm=foo"));
    }
}
