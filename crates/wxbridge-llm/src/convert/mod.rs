//! Conversion between the generic chat types and the watsonx.ai wire format

pub mod watsonx;
