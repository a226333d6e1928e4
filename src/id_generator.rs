use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scene object, unique within its scene for the scene's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-scene id counter. It only ever moves forward, so restoring an older
/// snapshot never makes an id available again.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume numbering after `id`, used when a scene is rebuilt from a saved
    /// document. `None` when no id after `id` exists.
    pub fn starting_after(id: ObjectId) -> Option<Self> {
        id.0.checked_add(1).map(|next| Self { next })
    }

    pub fn generate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// Make sure ids handed out later are all greater than `id`.
    pub fn reserve_past(&mut self, id: ObjectId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}
