//! `hierarchyChanged` subscriptions

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// Handle returned by [`ListenerRegistry::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn()>;

/// Payload-free change notification fan-out.
///
/// Listeners run synchronously in registration order. A `fire` issued while
/// listeners of the same registry are running is dropped.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
    firing: Cell<bool>,
}

struct FiringGuard<'a>(&'a Cell<bool>);

impl Drop for FiringGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn fire(&self) {
        if self.firing.get() {
            warn!("Suppressed nested hierarchy change notification");
            return;
        }
        self.firing.set(true);
        let _guard = FiringGuard(&self.firing);

        // Listeners may add or remove subscriptions while running
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("firing", &self.firing.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_fire_remove() {
        let registry = ListenerRegistry::new();
        let count = Rc::new(Cell::new(0));

        let counter = Rc::clone(&count);
        let id = registry.add(move || counter.set(counter.get() + 1));
        registry.fire();
        registry.fire();
        assert_eq!(count.get(), 2);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.fire();
        assert_eq!(count.get(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nested_fire_is_suppressed() {
        let registry = Rc::new(ListenerRegistry::new());
        let count = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&registry);
        let counter = Rc::clone(&count);
        registry.add(move || {
            counter.set(counter.get() + 1);
            if let Some(registry) = weak.upgrade() {
                registry.fire();
            }
        });

        registry.fire();
        assert_eq!(count.get(), 1);

        registry.fire();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let registry = Rc::new(ListenerRegistry::new());
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&registry);
        let own_id = Rc::clone(&slot);
        let id = registry.add(move || {
            if let (Some(registry), Some(id)) = (weak.upgrade(), own_id.get()) {
                registry.remove(id);
            }
        });
        slot.set(Some(id));

        registry.fire();
        assert!(registry.is_empty());
    }
}
