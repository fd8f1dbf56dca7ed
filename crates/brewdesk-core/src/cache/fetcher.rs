use brewdesk_api::{Dispatcher, RequestDescriptor};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::CoreError;

/// The network side of the cache: executes one request descriptor.
///
/// Implemented by [`Dispatcher`]; tests substitute an in-memory fetcher.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, request: RequestDescriptor) -> BoxFuture<'static, Result<Value, CoreError>>;
}

impl Fetcher for Dispatcher {
    fn fetch(&self, request: RequestDescriptor) -> BoxFuture<'static, Result<Value, CoreError>> {
        let dispatcher = self.clone();
        async move { dispatcher.dispatch(&request).await.map_err(CoreError::from) }.boxed()
    }
}
