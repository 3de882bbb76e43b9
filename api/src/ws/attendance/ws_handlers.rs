use serde::Deserialize;
use util::ws::handler_trait::WsHandler;
use util::ws::runtime::WsContext;

/// The teacher view is push-only; app-level pings are answered by the
/// server loop before they reach the handler.
#[derive(Debug, Deserialize)]
pub struct AttendanceIncoming {}

pub struct AttendanceWsHandler;

impl WsHandler for AttendanceWsHandler {
    type In = AttendanceIncoming;

    async fn on_open(&self, ctx: &WsContext) {
        tracing::debug!(topic = %ctx.topic, user = ?ctx.user_id, "Teacher joined session view");
    }

    async fn on_message(&self, ctx: &WsContext, _msg: Self::In) {
        tracing::debug!(topic = %ctx.topic, "Ignoring client frame on session view");
    }
}
