use serde::Deserialize;
use serde_json::json;
use util::ws::handler_trait::WsHandler;
use util::ws::runtime::WsContext;

/// Close code for a policy violation (RFC 6455 §7.4.1).
const POLICY_VIOLATION: u16 = 1008;

/// Announce frame a client sends after connecting.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsIncoming {
    pub student_id: i64,
}

pub struct NotificationsWsHandler;

impl WsHandler for NotificationsWsHandler {
    type In = NotificationsIncoming;

    async fn on_message(&self, ctx: &WsContext, msg: Self::In) {
        // The socket is already bound to the JWT subject; the announce is
        // only accepted when it names the same student.
        if ctx.user_id != Some(msg.student_id) {
            tracing::warn!(
                topic = %ctx.topic,
                announced = msg.student_id,
                authenticated = ?ctx.user_id,
                "Rejecting mismatched student announce"
            );
            let _ = ctx
                .reply_event("error", &json!({ "reason": "student_mismatch" }))
                .await;
            ctx.close(POLICY_VIOLATION, "student_mismatch").await;
            return;
        }

        let _ = ctx
            .reply_event("ready", &json!({ "studentId": msg.student_id }))
            .await;
    }
}
