//! Client-side WebSocket connection to the layout authority.
//!
//! [`WsConnection`] owns the socket and runs on a dedicated thread.  It
//! forwards every text frame it receives as [`Event::Inbound`] and
//! announces the connection's lifecycle with [`Event::ConnectionOpened`]
//! / [`Event::ConnectionClosed`].  Outbound frames are handed to it
//! through a [`WsSender`] and an in-memory queue.
//!
//! The socket uses a short read timeout so one thread can interleave
//! reading with draining the outbound queue.  Pings are answered by
//! tungstenite itself on the next read or write.
//!
//! There is no reconnection: once the socket closes, the source ends.

use crate::command::Event;
use crate::config::ConnectionConfig;
use crate::traits::{EventSource, Transport};
use log::{debug, info};
use std::io;
use std::net::TcpStream;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;
use tungstenite::client::IntoClientRequest;
use tungstenite::handshake::client::Request;
use tungstenite::http::header::{HeaderValue, InvalidHeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Errors produced by the WebSocket connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid subprotocol: {0}")]
    Subprotocol(#[from] InvalidHeaderValue),
    #[error("connection closed")]
    Closed,
}

/// Outbound handle: queues text frames for the connection thread.
#[derive(Debug, Clone)]
pub struct WsSender {
    tx: mpsc::Sender<String>,
}

impl Transport for WsSender {
    type Error = ConnectionError;

    fn send_text(&self, text: String) -> Result<(), ConnectionError> {
        self.tx.send(text).map_err(|_| ConnectionError::Closed)
    }
}

/// An [`EventSource`] that connects to the authority's WebSocket endpoint.
pub struct WsConnection {
    endpoint: String,
    subprotocol: Option<String>,
    poll_interval: Duration,
    outbound: mpsc::Receiver<String>,
}

impl WsConnection {
    /// Create a connection and the [`WsSender`] that feeds it.
    ///
    /// Nothing is opened until [`run`](EventSource::run) is called.
    pub fn new(config: &ConnectionConfig) -> (Self, WsSender) {
        let (tx, outbound) = mpsc::channel();
        let conn = Self {
            endpoint: config.endpoint.clone(),
            subprotocol: config.subprotocol.clone(),
            poll_interval: config.poll_interval(),
            outbound,
        };
        (conn, WsSender { tx })
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self) -> Result<Request, ConnectionError> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        if let Some(protocol) = &self.subprotocol {
            request
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_str(protocol)?);
        }
        Ok(request)
    }

    fn session(&self, sink: &mpsc::Sender<Event>) -> Result<(), ConnectionError> {
        let request = self.request()?;
        let (mut socket, response) = tungstenite::connect(request)?;
        info!("connected to {} ({})", self.endpoint, response.status());

        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream.set_read_timeout(Some(self.poll_interval))?;
        }

        if sink.send(Event::ConnectionOpened).is_err() {
            return Ok(());
        }
        self.pump(&mut socket, sink)
    }

    /// Shuttle frames until either side goes away.
    fn pump(&self, socket: &mut Socket, sink: &mpsc::Sender<Event>) -> Result<(), ConnectionError> {
        loop {
            loop {
                match self.outbound.try_recv() {
                    Ok(text) => socket.send(Message::text(text))?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("no more senders, closing connection");
                        let _ = socket.close(None);
                        let _ = socket.flush();
                        return Ok(());
                    }
                }
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    if sink.send(Event::Inbound(text.as_str().to_owned())).is_err() {
                        info!("sink closed, shutting down");
                        let _ = socket.close(None);
                        return Ok(());
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!("authority closed the connection: {:?}", frame);
                    return Ok(());
                }
                Ok(other) => debug!("ignoring non-text frame ({} bytes)", other.len()),
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl EventSource for WsConnection {
    type Error = ConnectionError;

    /// Connect and pump frames.
    ///
    /// This method **blocks** until the connection closes.  Run it on a
    /// dedicated thread.  It always ends by sending
    /// [`Event::ConnectionClosed`], also when connecting fails.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        let result = self.session(&sink);
        let _ = sink.send(Event::ConnectionClosed);
        result
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use tungstenite::handshake::server::{ErrorResponse, Request as ServerRequest, Response};

    const TIMEOUT: Duration = Duration::from_secs(3);

    fn config(endpoint: String) -> ConnectionConfig {
        ConnectionConfig {
            endpoint,
            subprotocol: Some("main".into()),
            poll_interval_ms: 20,
        }
    }

    /// Accept one client, push `greeting`, echo back the first text frame
    /// the client sends, then close.
    fn spawn_authority(greeting: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let callback =
                |_req: &ServerRequest, mut response: Response| -> Result<Response, ErrorResponse> {
                    response
                        .headers_mut()
                        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("main"));
                    Ok(response)
                };
            let Ok(mut ws) = tungstenite::accept_hdr(stream, callback) else {
                panic!("server handshake failed");
            };
            ws.send(Message::text(greeting.to_string())).expect("send greeting");
            loop {
                match ws.read() {
                    Ok(Message::Text(text)) => {
                        let _ = tx.send(text.as_str().to_owned());
                        break;
                    }
                    Ok(_) => continue,
                    Err(_) => return,
                }
            }
            let _ = ws.close(None);
            while ws.read().is_ok() {}
        });
        (format!("ws://{}", addr), rx)
    }

    #[test]
    fn request_carries_subprotocol() {
        let (conn, _tx) = WsConnection::new(&config("ws://localhost:8000".into()));
        let request = conn.request().unwrap();
        assert_eq!(
            request.headers().get(SEC_WEBSOCKET_PROTOCOL),
            Some(&HeaderValue::from_static("main"))
        );
    }

    #[test]
    fn request_without_subprotocol() {
        let mut cfg = config("ws://localhost:8000".into());
        cfg.subprotocol = None;
        let (conn, _tx) = WsConnection::new(&cfg);
        let request = conn.request().unwrap();
        assert!(request.headers().get(SEC_WEBSOCKET_PROTOCOL).is_none());
    }

    #[test]
    fn full_session_against_local_authority() {
        let greeting = r#"{"kind":"layout_state","data":{"state":{"workspaces":[],"outputs":[],"views":[]}}}"#;
        let (url, server_rx) = spawn_authority(greeting);

        let (mut conn, sender) = WsConnection::new(&config(url));
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || conn.run(tx));

        assert_eq!(rx.recv_timeout(TIMEOUT), Ok(Event::ConnectionOpened));
        assert_eq!(rx.recv_timeout(TIMEOUT), Ok(Event::Inbound(greeting.to_string())));

        let frame = r#"{"kind":"set_layout_state","state":{"workspaces":[],"outputs":[],"views":{}}}"#;
        sender.send_text(frame.to_string()).unwrap();
        assert_eq!(server_rx.recv_timeout(TIMEOUT).unwrap(), frame);

        assert_eq!(rx.recv_timeout(TIMEOUT), Ok(Event::ConnectionClosed));
        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn unreachable_endpoint_still_reports_closed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let (mut conn, _sender) = WsConnection::new(&config(format!("ws://127.0.0.1:{}", port)));
        let (tx, rx) = mpsc::channel();
        assert!(conn.run(tx).is_err());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Event::ConnectionClosed]);
    }

    #[test]
    fn sender_fails_once_connection_is_gone() {
        let (conn, sender) = WsConnection::new(&config("ws://localhost:8000".into()));
        drop(conn);
        assert!(matches!(
            sender.send_text("x".into()),
            Err(ConnectionError::Closed)
        ));
    }
}
