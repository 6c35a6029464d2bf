//! Wire format types for the watsonx.ai chat API
//!
//! Pure serde structs matching the vendor's JSON. They are only used at the
//! boundary and never handed to callers.

pub mod watsonx;
