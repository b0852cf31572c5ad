//! Stored objects: digests, the content-addressed store, and commit records.

pub mod commit;
pub mod digest;
pub mod store;

pub use commit::Commit;
pub use digest::{Digest, DIGEST_HEX_LEN};
pub use store::ObjectStore;
