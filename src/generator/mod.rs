//! Generation callbacks
//!
//! The controller treats generation as an opaque async call per item. Anything that
//! turns a [`BatchItem`] snapshot into a result or a [`GenerateError`] can drive a batch:
//! an LLM client wrapper, a shell command ([`CommandGenerator`]), or a closure via
//! [`generator_fn`].

mod command;

pub use command::{CommandConfig, CommandGenerator};

use std::future::Future;

use async_trait::async_trait;

use crate::domain::BatchItem;
use crate::error::GenerateError;

/// Result of a single generation call
pub type GenerateResult<R> = std::result::Result<R, GenerateError>;

/// Turns one item into a result. Retries, backoff and timeouts are the
/// implementation's business; the controller calls it once per attempt.
#[async_trait]
pub trait Generator<I, R>: Send + Sync {
    async fn generate(&self, item: BatchItem<I, R>) -> GenerateResult<R>;
}

/// Adapter that lets an async closure act as a [`Generator`]
pub struct FnGenerator<F> {
    f: F,
}

/// Wrap an async closure `|item| async move { ... }` as a generator
pub fn generator_fn<F>(f: F) -> FnGenerator<F> {
    FnGenerator { f }
}

#[async_trait]
impl<I, R, F, Fut> Generator<I, R> for FnGenerator<F>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(BatchItem<I, R>) -> Fut + Send + Sync,
    Fut: Future<Output = GenerateResult<R>> + Send,
{
    async fn generate(&self, item: BatchItem<I, R>) -> GenerateResult<R> {
        (self.f)(item).await
    }
}
