//! The interpreter's options object (spec §6): `context`, `authorizer`,
//! and `errorHandler`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{InterpretError, Operation};

/// Access policy consulted before every attribute read and method call
/// (spec §4.2, §7). Absent means "allow all".
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decide whether `operation` on `key` is allowed. `params` is the
    /// method's argument list for a `Call`, `None` for a `Get`.
    async fn authorize(&self, key: &str, operation: Operation, params: Option<&[Value]>) -> bool;
}

/// Wraps a plain (possibly synchronous-looking) closure as an
/// [`Authorizer`].
pub struct FnAuthorizer<F>(F);

impl<F> FnAuthorizer<F>
where
    F: Fn(&str, Operation, Option<&[Value]>) -> bool + Send + Sync,
{
    /// Build an authorizer from a closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Authorizer for FnAuthorizer<F>
where
    F: Fn(&str, Operation, Option<&[Value]>) -> bool + Send + Sync,
{
    async fn authorize(&self, key: &str, operation: Operation, params: Option<&[Value]>) -> bool {
        (self.0)(key, operation, params)
    }
}

/// Error recovery hook (spec §4.2, §7): replaces a failing node's output
/// with a substitute value. Never consulted for
/// [`InterpretError::AuthorizationDenied`].
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Produce a replacement value for the node that raised `error`.
    async fn handle(&self, error: &InterpretError) -> Value;
}

/// Wraps a plain closure as an [`ErrorHandler`].
pub struct FnErrorHandler<F>(F);

impl<F> FnErrorHandler<F>
where
    F: Fn(&InterpretError) -> Value + Send + Sync,
{
    /// Build an error handler from a closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(&InterpretError) -> Value + Send + Sync,
{
    async fn handle(&self, error: &InterpretError) -> Value {
        (self.0)(error)
    }
}

/// Options accepted by [`crate::interpreter::invoke_expression`] (spec §6).
#[derive(Clone, Default)]
pub struct InvokeOptions {
    /// Appended as the last argument to every method call.
    pub context: Option<Value>,
    /// Access policy; `None` allows everything.
    pub authorizer: Option<Arc<dyn Authorizer>>,
    /// Error recovery hook; `None` means errors propagate.
    pub error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl InvokeOptions {
    /// An options value with every field at its default (allow all, no
    /// context, no error recovery).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trailing context argument threaded through method calls.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the authorizer.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Set the error handler.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub(crate) async fn authorize(&self, key: &str, operation: Operation, params: Option<&[Value]>) -> bool {
        match &self.authorizer {
            Some(authorizer) => authorizer.authorize(key, operation, params).await,
            None => true,
        }
    }
}
