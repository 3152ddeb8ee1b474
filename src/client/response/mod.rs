//! Response payloads.
//!
//! Responses are decoded from a byte span that starts right after the
//! correlation id. Every response type also encodes its full decoded field
//! set, which is what a mock broker needs and what the round-trip tests
//! check.

mod groups;
mod offsets;

pub use groups::*;
pub use offsets::*;
