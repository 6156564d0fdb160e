use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Attribute carrying an item's identifier. Items whose root element lacks
/// this attribute (or carries an empty value) never appear in emitted
/// layout orders.
pub const ITEM_ID_ATTR: &str = "data-grid-item-id";

/// Attribute marking descendant elements that may initiate a drag gesture.
pub const DRAG_HANDLE_ATTR: &str = "data-grid-item-drag-handle";

/// Minimal DOM-equivalent node backing grid items and the container.
///
/// Attributes, content, and children are interior-mutable so item components
/// can mutate their own element while the grid holds a shared reference.
#[derive(Debug, Default)]
pub struct Element {
    tag: String,
    attributes: RwLock<HashMap<String, String>>,
    content: RwLock<String>,
    children: RwLock<Vec<ElementRef>>,
}

/// Shared handle to an [`Element`].
pub type ElementRef = Arc<Element>;

impl Element {
    pub fn new(tag: impl Into<String>) -> ElementRef {
        Arc::new(Self {
            tag: tag.into(),
            ..Self::default()
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attributes
            .read()
            .ok()
            .and_then(|guard| guard.get(name).cloned())
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut guard) = self.attributes.write() {
            guard.insert(name.into(), value.into());
        }
    }

    pub fn remove_attr(&self, name: &str) {
        if let Ok(mut guard) = self.attributes.write() {
            guard.remove(name);
        }
    }

    pub fn content(&self) -> String {
        self.content
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        if let Ok(mut guard) = self.content.write() {
            *guard = content.into();
        }
    }

    pub fn append_child(&self, child: ElementRef) {
        if let Ok(mut guard) = self.children.write() {
            guard.push(child);
        }
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.children
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The item identifier, or `None` when the attribute is absent or empty.
    pub fn item_id(&self) -> Option<String> {
        self.attr(ITEM_ID_ATTR).filter(|id| !id.is_empty())
    }
}

/// Convenience constructor for an item root element carrying its identifier.
pub fn item_element(item_id: impl Into<String>) -> ElementRef {
    let el = Element::new("div");
    el.set_attr(ITEM_ID_ATTR, item_id);
    el
}
