use super::runtime::WsContext;
use serde::de::DeserializeOwned;
use std::future::Future;

/// Feature hook plugged into `serve_topic`.
pub trait WsHandler: Send + Sync + 'static {
    /// Client frames this handler understands.
    type In: DeserializeOwned + Send;

    /// Called once presence is registered and the topic is being forwarded.
    fn on_open(&self, ctx: &WsContext) -> impl Future<Output = ()> + Send {
        async move {
            let _ = ctx;
        }
    }

    fn on_message(&self, ctx: &WsContext, msg: Self::In) -> impl Future<Output = ()> + Send;

    /// Called before presence is dropped.
    fn on_close(&self, ctx: &WsContext) -> impl Future<Output = ()> + Send {
        async move {
            let _ = ctx;
        }
    }
}
