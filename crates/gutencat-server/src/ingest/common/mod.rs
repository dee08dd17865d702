//! Utilities shared by the ingestion stages
//!
//! - **decompression**: outer container (zip/gzip) and inner tar expansion

pub mod decompression;
