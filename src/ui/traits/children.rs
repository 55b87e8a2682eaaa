//! Exclusive ownership of child components

use crate::ui::{Component, ComponentId};

/// Ordered child list: insertion order is paint order, last added is on top
pub trait ChildOwning {
    fn children(&self) -> &[Component];

    fn children_mut(&mut self) -> &mut Vec<Component>;

    fn add_child(&mut self, child: Component) -> ComponentId {
        let id = child.id();
        self.children_mut().push(child);
        id
    }

    /// Remove a direct child, handing ownership back to the caller
    fn remove_child(&mut self, id: ComponentId) -> Option<Component> {
        let children = self.children_mut();
        let index = children.iter().position(|c| c.id() == id)?;
        Some(children.remove(index))
    }

    fn clear_children(&mut self) {
        self.children_mut().clear();
    }

    /// Move the whole child list out, leaving the node empty
    fn take_children(&mut self) -> Vec<Component> {
        std::mem::take(self.children_mut())
    }

    fn set_children(&mut self, children: Vec<Component>) {
        *self.children_mut() = children;
    }

    /// Depth-first search of the subtree, excluding self
    fn find(&self, id: ComponentId) -> Option<&Component> {
        for child in self.children() {
            if child.id() == id {
                return Some(child);
            }
            if let Some(found) = child.find(id) {
                return Some(found);
            }
        }
        None
    }

    fn find_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        for child in self.children_mut().iter_mut() {
            if child.id() == id {
                return Some(child);
            }
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }
}
