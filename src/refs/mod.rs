//! References (HEAD and the named ref it points at).

pub mod head;
pub mod resolver;

pub use head::Head;
pub use resolver::{RefStore, RefValue, DEFAULT_REF, HEAD};
