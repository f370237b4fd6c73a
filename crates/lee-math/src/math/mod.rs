//! Core math modules.

pub mod chi2;
pub mod normal;
pub mod roots;
