//! Request payloads.
//!
//! Each payload can be built from domain values, encoded for a given API
//! version, and parsed back. Encoding lives on the payload types
//! (`encode_versioned` / `encoded_len_versioned` for versioned layouts,
//! [`ToByte`](crate::encode::ToByte) otherwise); the `parse_*` functions are
//! the inverse.

mod groups;
mod offsets;

pub use groups::*;
pub use offsets::*;
