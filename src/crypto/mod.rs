pub mod hash;
pub mod signature;

pub use hash::{sha256, sha256_hex};
pub use signature::SignatureEngine;
