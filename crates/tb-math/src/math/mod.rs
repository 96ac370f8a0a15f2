//! Core math modules.

pub mod opinion;
pub mod fusion;
pub mod similarity;
