//! Integration tests for the WebSocket client transport.
//!
//! Each test spins up a throwaway `tokio-tungstenite` server on an
//! OS-assigned port and plays the matchmaking service against our client.

#[cfg(feature = "websocket")]
mod websocket {
    use arenalink_transport::{
        Connection, Connector, TransportError, WebSocketConnector,
    };
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a random port and returns it with its URL.
    async fn bind_service() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        (listener, format!("ws://{addr}"))
    }

    async fn accept(listener: TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    }

    #[tokio::test]
    async fn test_connect_send_and_receive_text() {
        let (listener, url) = bind_service().await;
        let server = tokio::spawn(accept(listener));

        let conn = WebSocketConnector
            .connect(&url)
            .await
            .expect("client should connect");
        let mut service = server.await.expect("task should complete");

        assert!(conn.id().into_inner() > 0);

        // --- Client sends, service receives a text frame ---
        conn.send(br#"{"type":"cancel_queue"}"#)
            .await
            .expect("send should succeed");
        let msg = service.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON must travel as a text frame");
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"cancel_queue"}"#);

        // --- Service sends, client receives ---
        service
            .send(Message::Text(r#"{"type":"queued"}"#.to_owned().into()))
            .await
            .unwrap();
        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"type":"queued"}"#);

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_parked_reader() {
        let (listener, url) = bind_service().await;
        let server = tokio::spawn(accept(listener));

        let conn = std::sync::Arc::new(
            WebSocketConnector.connect(&url).await.unwrap(),
        );
        let mut service = server.await.unwrap();

        // A reader parks in recv() with nothing to read...
        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        // ...and a send still goes through.
        conn.send(b"ping-from-client").await.expect("send should succeed");
        let msg = service.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"ping-from-client");

        service.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().expect("recv should not error");
        assert!(result.is_none(), "close frame should end the stream");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_service_close() {
        let (listener, url) = bind_service().await;
        let server = tokio::spawn(accept(listener));

        let conn = WebSocketConnector.connect(&url).await.unwrap();
        let mut service = server.await.unwrap();

        service.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on service close");
    }

    #[tokio::test]
    async fn test_connect_refused_returns_connect_failed() {
        // Bind then drop so the port is (almost certainly) closed.
        let (listener, url) = bind_service().await;
        drop(listener);

        let result = WebSocketConnector.connect(&url).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
