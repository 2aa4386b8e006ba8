//! Ordered storage for overlay elements.
//!
//! List order is z-order: later elements draw on top. Every lookup by id
//! reports a miss through its return value instead of an error, since the UI
//! may race a delete against a stale transform update.

use crate::element::{Element, ElementId, ElementKind, Transform};

/// The ordered collection of overlay elements in a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element on top of the others.
    pub fn push(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Position of an element in z-order.
    #[must_use]
    pub fn position(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// Replace an element's content, keeping its id, transform and z-order.
    ///
    /// Returns `false` if no element has this id.
    pub fn replace_content(&mut self, id: &ElementId, kind: ElementKind) -> bool {
        match self.elements.iter_mut().find(|e| &e.id == id) {
            Some(element) => {
                element.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Overwrite an element's transform.
    ///
    /// Returns `false` if no element has this id.
    pub fn set_transform(&mut self, id: &ElementId, transform: Transform) -> bool {
        match self.elements.iter_mut().find(|e| &e.id == id) {
            Some(element) => {
                element.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Remove an element, returning it if it existed.
    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let index = self.position(id)?;
        Some(self.elements.remove(index))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Elements in z-order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Elements in z-order as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<'a> IntoIterator for &'a ElementStore {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TextAlign;
    use crate::geometry::Vec2;
    use crate::resource::{ColorRef, ImageRef};

    fn image(src: &str) -> Element {
        Element::image(ImageRef::new(src))
    }

    #[test]
    fn test_push_preserves_order() {
        let mut store = ElementStore::new();
        let a = store.push(image("a"));
        let b = store.push(image("b"));
        let c = store.push(image("c"));

        let order: Vec<_> = store.iter().map(|e| e.id.clone()).collect();
        assert_eq!(order, vec![a, b, c.clone()]);
        assert_eq!(store.position(&c), Some(2));
    }

    #[test]
    fn test_replace_content_keeps_transform() {
        let mut store = ElementStore::new();
        let id = store.push(Element::text("Hi", None, ColorRef::WHITE, TextAlign::Center));
        let moved = Transform {
            offset: Vec2::new(10.0, -4.0),
            rotation: 33.0,
            ..Transform::default()
        };
        assert!(store.set_transform(&id, moved));

        let replaced = store.replace_content(
            &id,
            ElementKind::Text {
                text: "Bye".to_string(),
                font: None,
                color: ColorRef::BLACK,
                align: TextAlign::Right,
            },
        );
        assert!(replaced);

        let element = store.get(&id).expect("element");
        assert_eq!(element.transform, moved);
        assert!(matches!(&element.kind, ElementKind::Text { text, .. } if text == "Bye"));
    }

    #[test]
    fn test_misses_are_reported_not_raised() {
        let mut store = ElementStore::new();
        let ghost = ElementId::new();
        assert!(store.get(&ghost).is_none());
        assert!(!store.set_transform(&ghost, Transform::default()));
        assert!(!store.replace_content(&ghost, ElementKind::Image { image: ImageRef::new("x") }));
        assert!(store.remove(&ghost).is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = ElementStore::new();
        let keep = store.push(image("keep"));
        let gone = store.push(image("gone"));

        assert!(store.remove(&gone).is_some());
        let after_first = store.clone();
        assert!(store.remove(&gone).is_none());
        assert_eq!(store, after_first);
        assert_eq!(store.len(), 1);
        assert!(store.get(&keep).is_some());
    }
}
