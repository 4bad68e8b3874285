//! Synchronous change notification.
//!
//! Listeners are plain closures. They run on the caller's thread, in
//! registration order, before the mutating call returns. A panicking
//! listener unwinds through the mutating call.

use std::{fmt, rc::Rc};

use crate::domain::{element::ElementKey, property::PropertyKey};

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A list of listeners for events of type `E`.
///
/// Duplicate registrations are not detected: registering the same closure
/// twice delivers each event to it twice.
pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Rc<dyn Fn(&E)>)>,
}

impl<E> Listeners<E> {
    /// Register a listener.
    pub fn add(&mut self, listener: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Rc::new(listener)));
        id
    }

    /// Remove a previously registered listener.
    ///
    /// Returns `true` if the listener was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// The number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every listener registered when dispatch starts.
    pub fn dispatch(&self, event: &E) {
        let snapshot: Vec<_> = self.entries.iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// What changed on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A static or dynamic property was written.
    Property(PropertyKey),
    /// The element id was set or cleared.
    ElementId,
    /// An anchor was added to or removed from a line.
    Anchors,
    /// A line's intermediate points were replaced.
    Waypoints,
}

/// An element-level change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementEvent {
    /// The element that changed.
    pub element: ElementKey,
    /// What changed.
    pub change: Change,
}

/// A document-level change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// An element was added to the model.
    Added(ElementKey),
    /// An element was removed from the model.
    Deleted(ElementKey),
    /// An attached element was modified.
    Modified(ElementEvent),
}

impl ModelEvent {
    /// The element this event concerns.
    #[must_use]
    pub const fn element(&self) -> ElementKey {
        match self {
            Self::Added(key) | Self::Deleted(key) => *key,
            Self::Modified(event) => event.element,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn delivers_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::<u32>::default();
        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            listeners.add(move |n: &u32| log.borrow_mut().push(format!("{name}{n}")));
        }

        listeners.dispatch(&1);

        assert_eq!(*log.borrow(), ["a1", "b1", "c1"]);
    }

    #[test]
    fn removed_listeners_are_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::<()>::default();
        let id = {
            let count = Rc::clone(&count);
            listeners.add(move |_: &()| *count.borrow_mut() += 1)
        };

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.dispatch(&());

        assert_eq!(*count.borrow(), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn duplicate_registrations_are_kept() {
        let count = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::<()>::default();
        let listener = {
            let count = Rc::clone(&count);
            move |_: &()| *count.borrow_mut() += 1
        };
        listeners.add(listener.clone());
        listeners.add(listener);

        listeners.dispatch(&());

        assert_eq!(*count.borrow(), 2);
        assert_eq!(listeners.len(), 2);
    }
}
