//! Transport seam
//!
//! The engine issues requests through this trait only. Retry, backoff and
//! rate limiting belong to the implementation, never to the engine.

use crate::error::Result;
use crate::request::RequestTarget;
use async_trait::async_trait;
use std::sync::Arc;

/// Issues one request and returns the raw response body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `target`; transport failures are returned as errors
    async fn fetch(&self, target: &RequestTarget) -> Result<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, target: &RequestTarget) -> Result<String> {
        (**self).fetch(target).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn fetch(&self, target: &RequestTarget) -> Result<String> {
        (**self).fetch(target).await
    }
}
