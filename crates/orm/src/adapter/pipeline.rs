//! Middleware pipeline around adapter calls
//!
//! Each middleware receives the call and a [`Next`] carrying the rest of the
//! chain. Work done before `next.run(call)` sees the call on its way to
//! storage; work done after sees the output on its way back. The first
//! middleware of a pipeline is the outermost one.

use super::decorated::Runtime;
use super::decorators::{
    DefaultValuesStage, FieldsFilteringStage, InclusionStage, SanitizingStage,
    TransformationStage, UniquenessStage, ValidationStage,
};
use super::operation::{Operation, Output};
use super::{Adapter, AdapterContext};
use modelkit_core::{ModelResult, Schema};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for boxed future in Next
pub type NextFuture<'a> = Pin<Box<dyn Future<Output = ModelResult<Output>> + Send + 'a>>;

/// Next represents the rest of the middleware chain
pub struct Next {
    handler: Box<dyn FnOnce(Call) -> NextFuture<'static> + Send>,
}

impl Next {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(Call) -> NextFuture<'static> + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Run the rest of the chain with the given call
    pub async fn run(self, call: Call) -> ModelResult<Output> {
        (self.handler)(call).await
    }
}

/// A stage of the adapter pipeline.
/// Uses boxed futures to be dyn-compatible.
pub trait Middleware: Send + Sync + fmt::Debug {
    fn handle(&self, call: Call, next: Next) -> NextFuture<'static>;

    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Access to the decorated adapter a call runs on
#[derive(Clone)]
pub struct CallHandle {
    runtime: Arc<Runtime>,
    depth: usize,
}

impl CallHandle {
    pub(crate) fn new(runtime: Arc<Runtime>, depth: usize) -> Self {
        Self { runtime, depth }
    }

    pub fn context(&self) -> &AdapterContext {
        self.runtime.context()
    }

    pub fn schema(&self) -> &Schema {
        &self.runtime.context().schema
    }

    /// The undecorated adapter
    pub fn storage(&self) -> Arc<dyn Adapter> {
        self.runtime.storage()
    }

    /// Nesting level; calls made by the caller are at depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Issue another call through the whole pipeline, one level deeper
    pub fn run(&self, operation: Operation) -> NextFuture<'static> {
        Runtime::run(&self.runtime, operation, self.depth + 1)
    }
}

impl fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHandle")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// An adapter call travelling through the pipeline
#[derive(Debug)]
pub struct Call {
    pub operation: Operation,
    handle: CallHandle,
}

impl Call {
    pub fn new(operation: Operation, handle: CallHandle) -> Self {
        Self { operation, handle }
    }

    pub fn handle(&self) -> &CallHandle {
        &self.handle
    }

    pub fn context(&self) -> &AdapterContext {
        self.handle.context()
    }

    pub fn schema(&self) -> &Schema {
        self.handle.schema()
    }

    pub fn storage(&self) -> Arc<dyn Adapter> {
        self.handle.storage()
    }

    pub fn depth(&self) -> usize {
        self.handle.depth()
    }
}

/// Ordered list of middleware wrapped around an adapter
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard stages, outermost first: sanitizing, default values,
    /// transformation, validation, uniqueness, fields filtering, inclusion
    pub fn standard() -> Self {
        Self::new()
            .add(SanitizingStage)
            .add(DefaultValuesStage)
            .add(TransformationStage)
            .add(ValidationStage)
            .add(UniquenessStage)
            .add(FieldsFilteringStage)
            .add(InclusionStage)
    }

    /// Add middleware to the pipeline
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Add an already shared middleware to the pipeline
    pub fn add_boxed(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Execute the pipeline around a handler that performs the call.
    /// The boxed `Next` chain is built for this call only.
    pub fn execute<F>(&self, call: Call, handler: F) -> NextFuture<'static>
    where
        F: FnOnce(Call) -> NextFuture<'static> + Send + 'static,
    {
        let mut chain = Box::new(handler) as Box<dyn FnOnce(Call) -> NextFuture<'static> + Send>;

        for middleware in self.middleware.iter().rev() {
            let middleware = middleware.clone();
            let next_handler = chain;
            chain = Box::new(move |call: Call| {
                let next = Next::new(next_handler);
                middleware.handle(call, next)
            });
        }

        chain(call)
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Middleware names, outermost first
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }
}

impl From<Vec<Arc<dyn Middleware>>> for Pipeline {
    fn from(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middleware }
    }
}
