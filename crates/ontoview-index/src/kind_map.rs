//! One slot per entity kind

use ontoview_core::EntityKind;

/// Fixed-size container keyed by [`EntityKind`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindMap<T> {
    slots: [T; EntityKind::COUNT],
}

impl<T> KindMap<T> {
    pub fn from_fn(mut init: impl FnMut(EntityKind) -> T) -> Self {
        Self {
            slots: EntityKind::ALL.map(|kind| init(kind)),
        }
    }

    pub fn get(&self, kind: EntityKind) -> &T {
        &self.slots[kind.ordinal()]
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut T {
        &mut self.slots[kind.ordinal()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &T)> {
        EntityKind::ALL.iter().copied().zip(self.slots.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}
