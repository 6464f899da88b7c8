// storefront-flow/src/core/context.rs

//! The boxed handler signature every pipeline hook is stored as.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A pipeline step handler.
///
/// Receives a clone of the run's `ContextData<TData>` (same underlying data)
/// and resolves to `Continue`, `Stop` or the pipeline's error type.
///
/// Handlers take locks in short scopes and drop the guards before any
/// `.await`; the context is shared with every later handler of the run.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
