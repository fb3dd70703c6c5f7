//! Minimal Chrome DevTools Protocol session over a blocking WebSocket.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use aitk_contracts::{NetworkFailure, ToolError};
use serde_json::{json, Map, Value};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect as websocket_connect, Message as WsMessage, WebSocket};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub(crate) struct CdpConnection {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    backlog: VecDeque<Value>,
}

impl CdpConnection {
    pub(crate) fn open(ws_url: &str) -> Result<Self, ToolError> {
        let (mut ws, _) = websocket_connect(ws_url).map_err(|err| {
            ToolError::Navigation(format!("failed to connect to browser DevTools: {err}"))
        })?;
        set_socket_read_timeout(&mut ws, Some(POLL_INTERVAL));
        Ok(Self {
            ws,
            next_id: 0,
            backlog: VecDeque::new(),
        })
    }

    /// Sends one command and waits for its reply; events read meanwhile are queued.
    pub(crate) fn call(
        &mut self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
        deadline: Instant,
    ) -> Result<Value, ToolError> {
        self.next_id += 1;
        let id = self.next_id;
        let mut message = Map::new();
        message.insert("id".to_string(), json!(id));
        message.insert("method".to_string(), json!(method));
        message.insert("params".to_string(), params);
        if let Some(session_id) = session_id {
            message.insert("sessionId".to_string(), json!(session_id));
        }
        let raw = serde_json::to_string(&Value::Object(message))
            .map_err(|err| ToolError::Navigation(format!("failed to encode {method}: {err}")))?;
        self.ws
            .send(WsMessage::Text(raw.into()))
            .map_err(|err| ToolError::Navigation(format!("failed to send {method}: {err}")))?;

        loop {
            let message = self.read_message(deadline, method)?;
            if message.get("id").and_then(Value::as_u64) == Some(id) {
                if let Some(error) = message.get("error") {
                    let text = error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown DevTools error");
                    return Err(ToolError::Navigation(format!("{method}: {text}")));
                }
                return Ok(message.get("result").cloned().unwrap_or(Value::Null));
            }
            if message.get("method").is_some() {
                self.backlog.push_back(message);
            }
        }
    }

    pub(crate) fn next_event(&mut self, deadline: Instant, waiting_for: &str) -> Result<Value, ToolError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(event);
        }
        loop {
            let message = self.read_message(deadline, waiting_for)?;
            if message.get("method").is_some() {
                return Ok(message);
            }
        }
    }

    fn read_message(&mut self, deadline: Instant, waiting_for: &str) -> Result<Value, ToolError> {
        loop {
            if Instant::now() >= deadline {
                return Err(ToolError::network(
                    NetworkFailure::Timeout,
                    format!("timed out waiting for {waiting_for}"),
                ));
            }
            let message = match self.ws.read() {
                Ok(message) => message,
                Err(tungstenite::Error::Io(err))
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    continue;
                }
                Err(err) => {
                    return Err(ToolError::Navigation(format!(
                        "browser connection lost while waiting for {waiting_for}: {err}"
                    )))
                }
            };
            let raw = match message {
                WsMessage::Text(text) => text.to_string(),
                WsMessage::Binary(bytes) => String::from_utf8_lossy(&bytes).to_string(),
                WsMessage::Close(_) => {
                    return Err(ToolError::Navigation(format!(
                        "browser closed the connection while waiting for {waiting_for}"
                    )))
                }
                _ => continue,
            };
            if let Ok(parsed) = serde_json::from_str::<Value>(&raw) {
                return Ok(parsed);
            }
        }
    }

    pub(crate) fn close(mut self) {
        let _ = self.ws.close(None);
    }
}

fn set_socket_read_timeout(
    ws: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    timeout: Option<Duration>,
) {
    if let MaybeTlsStream::Plain(stream) = ws.get_mut() {
        let _ = stream.set_read_timeout(timeout);
    }
}
