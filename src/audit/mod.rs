//! Chain-of-custody support: content hashing of inputs and results, and a
//! cache that is only ever keyed by those hashes.

pub mod cache;
pub mod provenance;
