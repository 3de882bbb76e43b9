use axum::Router;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{client::IntoClientRequest, handshake::client::Response};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the app on a random local port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    addr
}

/// Connects to `/ws/{path}?token=...`.
pub async fn connect_ws(
    addr: SocketAddr,
    path: &str,
    token: &str,
) -> Result<(Socket, Response), tokio_tungstenite::tungstenite::Error> {
    let url = Url::parse(&format!("ws://{addr}/ws/{path}?token={token}")).unwrap();
    let req = url.to_string().into_client_request().unwrap();
    connect_async(req).await
}

/// Next text frame parsed as JSON, skipping control frames. Panics after
/// `ms` milliseconds of silence.
pub async fn next_json(socket: &mut Socket, ms: u64) -> serde_json::Value {
    use futures_util::StreamExt;
    use tokio_tungstenite::tungstenite::Message;

    loop {
        let frame = tokio::time::timeout(std::time::Duration::from_millis(ms), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket ended")
            .expect("socket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Close(frame) => panic!("socket closed: {frame:?}"),
            _ => continue,
        }
    }
}

pub async fn send_json(socket: &mut Socket, value: serde_json::Value) {
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;

    socket.send(Message::Text(value.to_string().into())).await.unwrap();
}
