use crate::ws::core::event::Event;
use util::ws::{WebSocketManager, emit as emit_enveloped};

/// Wraps `ev` in the standard envelope and broadcasts it on its own topic.
/// Returns the number of live receivers.
pub async fn emit<E>(ws: &WebSocketManager, ev: &E) -> usize
where
    E: Event,
{
    let topic = ev.topic_path();
    emit_enveloped(ws, &topic, E::NAME, ev).await
}
