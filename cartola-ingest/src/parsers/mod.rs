//! Bank-specific statement extractors.

pub mod banco_chile;
