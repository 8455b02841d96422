//! CLI command implementations.

pub(crate) mod export;
pub(crate) mod run;
pub(crate) mod symbols;
