// storefront-flow/src/pipeline/mod.rs

//! `Pipeline<TData, Err>`: definition and structural edits, hook
//! registration, and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
