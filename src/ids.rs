//! Identity generation for new nodes and roots.

use uuid::Uuid;

/// Source of globally unique ids. No ordering contract.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// UUIDv7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
