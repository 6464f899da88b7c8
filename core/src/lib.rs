// storefront-flow/src/lib.rs

//! Async workflow building blocks for the storefront.
//!
//! - `Pipeline<TData, Err>`: named steps, each with before/on/after hooks,
//!   run in order against a shared `ContextData<TData>`.
//! - `FlowRegistry<Err>`: pipelines keyed by their context type, so callers
//!   only need the context to pick the workflow.
//! - `EventBus<E, Err>`: domain events delivered to explicitly subscribed
//!   handlers in subscription order.

pub mod core;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::events::{EventBus, EventHandler};
pub use crate::error::{FlowError, FlowResult};
pub use crate::registry::FlowRegistry;

/*
    Typical wiring:
    1. Define a context struct `MyCtx` holding inputs, shared services and outputs.
    2. Build a `Pipeline<MyCtx, MyErr>` with its step list and attach handlers
       with `.on_root()`, `.before_root()` or `.after_root()`.
    3. Register it on a `FlowRegistry<MyErr>` at startup.
    4. Per request: wrap a fresh `MyCtx` in `ContextData`, call
       `registry.run(ctx.clone()).await`, then read outputs from `ctx`.
*/
