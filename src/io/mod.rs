//! Export of quote results to files.

pub mod export;
