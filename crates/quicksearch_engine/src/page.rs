//! Page model the presenter mutates.
//!
//! `PageDom` is the seam between the runtime and whatever hosts the page.
//! `MemoryPage` keeps a parsed `scraper::Html` and edits its tree in place,
//! which is enough to drive the presenter in tests and in the command line
//! client.

use ego_tree::NodeId;
use html5ever::{local_name, ns, Attribute, LocalName, QualName};
use quicksearch_logging::search_debug;
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector, StrTendril};

/// Region-addressed page operations. Regions are elements found by `id`;
/// operations on a missing region do nothing and return `false`.
pub trait PageDom: Send {
    fn inner_html(&self, id: &str) -> Option<String>;
    fn set_inner_html(&mut self, id: &str, markup: &str) -> bool;
    fn style(&self, id: &str, property: &str) -> Option<String>;
    fn set_style(&mut self, id: &str, property: &str, value: &str) -> bool;
    fn has_class(&self, id: &str, class: &str) -> bool;
    fn add_class(&mut self, id: &str, class: &str) -> bool;
    fn remove_class(&mut self, id: &str, class: &str) -> bool;
    fn attribute(&self, id: &str, name: &str) -> Option<String>;
    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool;
    /// Removes every element carrying `class`; returns how many were removed.
    fn remove_with_class(&mut self, class: &str) -> usize;
    /// Removes `class` from every element carrying it; returns how many changed.
    fn strip_class(&mut self, class: &str) -> usize;
    /// Document title with whitespace stripped and collapsed.
    fn title(&self) -> String;
    fn set_title(&mut self, title: &str);
    /// Swaps the whole document, as a navigation would.
    fn replace_document(&mut self, markup: &str);
    fn to_html(&self) -> String;
}

/// In-memory document backed by `scraper`.
///
/// Detached nodes stay in the underlying arena; lookups always start from the
/// root element so they never see them.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    document: Html,
}

impl MemoryPage {
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Element with the given `id`, if it is attached to the document.
    pub fn element(&self, id: &str) -> Option<ElementRef<'_>> {
        self.select_first(&format!("#{id}"))
    }

    fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(css)?;
        let found = self.document.root_element().select(&selector).next();
        found
    }

    fn select_ids(&self, css: &str) -> Vec<NodeId> {
        match parse_selector(css) {
            Some(selector) => self
                .document
                .root_element()
                .select(&selector)
                .map(|element| element.id())
                .collect(),
            None => Vec::new(),
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.document.tree.root().id();
        self.document
            .tree
            .get(node)
            .is_some_and(|node| node.ancestors().any(|ancestor| ancestor.id() == root))
    }

    /// Rewrites the attributes of `node`. The element is rebuilt so scraper's
    /// cached id and class lists follow the new attributes.
    fn rewrite_attrs(&mut self, node: NodeId, apply: impl FnOnce(&mut Vec<(QualName, String)>)) {
        let Some(mut node) = self.document.tree.get_mut(node) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };
        let mut attrs: Vec<(QualName, String)> = element
            .attrs
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        apply(&mut attrs);

        let attributes = attrs
            .into_iter()
            .map(|(name, value)| Attribute {
                name,
                value: html5ever::tendril::StrTendril::from_slice(&value),
            })
            .collect();
        let rebuilt = Element::new(element.name.clone(), attributes);
        *node.value() = Node::Element(rebuilt);
    }

    fn update_element(
        &mut self,
        id: &str,
        apply: impl FnOnce(&mut Vec<(QualName, String)>),
    ) -> bool {
        match self.element(id).map(|element| element.id()) {
            Some(node) => {
                self.rewrite_attrs(node, apply);
                true
            }
            None => false,
        }
    }

    fn detach_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = match self.document.tree.get(parent) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => return,
        };
        for child in children {
            if let Some(mut child) = self.document.tree.get_mut(child) {
                child.detach();
            }
        }
    }

    fn replace_children(&mut self, parent: NodeId, markup: &str) {
        self.detach_children(parent);

        let fragment = Html::parse_fragment(markup);
        let tree = &mut self.document.tree;
        let fragment_root = tree.extend_tree(fragment.tree).id();
        // Fragment parsing wraps the content in an `<html>` element.
        let content: Vec<NodeId> = tree
            .get(fragment_root)
            .and_then(|root| root.children().find(|child| child.value().is_element()))
            .map(|wrapper| wrapper.children().map(|child| child.id()).collect())
            .unwrap_or_default();

        if let Some(mut parent) = tree.get_mut(parent) {
            for child in content {
                parent.append_id(child);
            }
        }
    }
}

impl PageDom for MemoryPage {
    fn inner_html(&self, id: &str) -> Option<String> {
        self.element(id).map(|element| element.inner_html())
    }

    fn set_inner_html(&mut self, id: &str, markup: &str) -> bool {
        match self.element(id).map(|element| element.id()) {
            Some(node) => {
                self.replace_children(node, markup);
                true
            }
            None => false,
        }
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        let element = self.element(id)?;
        parse_style(element.value().attr("style").unwrap_or_default())
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> bool {
        self.update_element(id, |attrs| {
            let mut declarations = parse_style(attr(attrs, "style").unwrap_or_default());
            match declarations
                .iter_mut()
                .find(|(name, _)| name.eq_ignore_ascii_case(property))
            {
                Some((_, current)) => value.clone_into(current),
                None => declarations.push((property.to_owned(), value.to_owned())),
            }
            let style = declarations
                .iter()
                .map(|(name, value)| format!("{name}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
            set_attr(attrs, "style", &style);
        })
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id)
            .is_some_and(|element| element.value().classes().any(|c| c == class))
    }

    fn add_class(&mut self, id: &str, class: &str) -> bool {
        self.update_element(id, |attrs| {
            let current = attr(attrs, "class").unwrap_or_default();
            if current.split_ascii_whitespace().any(|c| c == class) {
                return;
            }
            let classes = match current.trim() {
                "" => class.to_owned(),
                existing => format!("{existing} {class}"),
            };
            set_attr(attrs, "class", &classes);
        })
    }

    fn remove_class(&mut self, id: &str, class: &str) -> bool {
        self.update_element(id, |attrs| {
            remove_class_from(attrs, class);
        })
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.element(id)
            .and_then(|element| element.value().attr(name))
            .map(str::to_owned)
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool {
        self.update_element(id, |attrs| set_attr(attrs, name, value))
    }

    fn remove_with_class(&mut self, class: &str) -> usize {
        let mut removed = 0;
        for node in self.select_ids(&format!(".{class}")) {
            // Nested matches go with their removed ancestor.
            if !self.is_attached(node) {
                continue;
            }
            if let Some(mut node) = self.document.tree.get_mut(node) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }

    fn strip_class(&mut self, class: &str) -> usize {
        let nodes = self.select_ids(&format!(".{class}"));
        let changed = nodes.len();
        for node in nodes {
            self.rewrite_attrs(node, |attrs| {
                remove_class_from(attrs, class);
            });
        }
        changed
    }

    fn title(&self) -> String {
        self.select_first("title")
            .map(|title| {
                title
                    .text()
                    .flat_map(str::split_ascii_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    fn set_title(&mut self, title: &str) {
        let node = match self.select_first("title").map(|element| element.id()) {
            Some(node) => node,
            None => {
                let head = self
                    .select_first("head")
                    .map(|element| element.id())
                    .unwrap_or_else(|| self.document.root_element().id());
                let Some(mut head) = self.document.tree.get_mut(head) else {
                    return;
                };
                let name = QualName::new(None, ns!(html), local_name!("title"));
                let element = Element::new(name, Vec::new());
                head.append(Node::Element(element)).id()
            }
        };
        self.detach_children(node);
        if let Some(mut node) = self.document.tree.get_mut(node) {
            node.append(Node::Text(Text {
                text: StrTendril::from(title),
            }));
        }
    }

    fn replace_document(&mut self, markup: &str) {
        self.document = Html::parse_document(markup);
    }

    fn to_html(&self) -> String {
        self.document.html()
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            search_debug!("unusable selector {}: {}", css, err);
            None
        }
    }
}

fn attr<'a>(attrs: &'a [(QualName, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(attr, _)| attr.local.eq_str_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn set_attr(attrs: &mut Vec<(QualName, String)>, name: &str, value: &str) {
    match attrs
        .iter_mut()
        .find(|(attr, _)| attr.local.eq_str_ignore_ascii_case(name))
    {
        Some((_, current)) => value.clone_into(current),
        None => attrs.push((
            QualName::new(None, ns!(), LocalName::from(name)),
            value.to_owned(),
        )),
    }
}

/// Drops `class`; an emptied `class` attribute is removed entirely.
fn remove_class_from(attrs: &mut Vec<(QualName, String)>, class: &str) {
    let Some(current) = attr(attrs, "class") else {
        return;
    };
    let remaining = current
        .split_ascii_whitespace()
        .filter(|c| *c != class)
        .collect::<Vec<_>>()
        .join(" ");
    if remaining.is_empty() {
        attrs.retain(|(attr, _)| !attr.local.eq_str_ignore_ascii_case("class"));
    } else {
        set_attr(attrs, "class", &remaining);
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}
