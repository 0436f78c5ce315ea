// src/reload/server.rs

//! Live reload WebSocket server.
//!
//! A plain `TcpListener` plus one acceptor thread; connected sockets are kept
//! in a shared list and written to synchronously on notify. Dead clients are
//! dropped on the first failed send, so broadcasts are best-effort and never
//! fail the build that triggered them.

use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use tracing::{debug, warn};
use tungstenite::protocol::Message;
use tungstenite::WebSocket;

use crate::errors::Result;
use crate::reload::message::ReloadMessage;

const MAX_PORT_RETRIES: u16 = 10;

type ClientList = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

#[derive(Clone)]
pub struct ReloadNotifier {
    clients: ClientList,
    port: u16,
}

impl ReloadNotifier {
    /// Bind near `base_port` and start accepting browser connections.
    pub fn start(base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
        let clients: ClientList = Arc::new(Mutex::new(Vec::new()));

        let accept_list = Arc::clone(&clients);
        std::thread::spawn(move || accept_loop(listener, accept_list));

        debug!(port, "live reload listening");
        Ok(Self { clients, port })
    }

    /// Port actually bound; may differ from the configured one when it was
    /// already taken.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn notify_full(&self) {
        self.broadcast(&ReloadMessage::Reload);
    }

    pub fn notify_style(&self, files: Vec<String>) {
        self.broadcast(&ReloadMessage::Css { files });
    }

    fn broadcast(&self, msg: &ReloadMessage) {
        let json = msg.to_json();
        let Ok(mut clients) = self.clients.lock() else {
            return;
        };
        let before = clients.len();
        clients.retain_mut(|ws| ws.send(Message::Text(json.clone().into())).is_ok());
        let dropped = before - clients.len();
        if dropped > 0 {
            debug!(dropped, "pruned dead live-reload clients");
        }
        debug!(clients = clients.len(), msg = %json, "live reload broadcast");
    }
}

fn accept_loop(listener: TcpListener, clients: ClientList) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => match tungstenite::accept(stream) {
                Ok(mut ws) => {
                    debug!(%addr, "live reload client connected");
                    if ws
                        .send(Message::Text(ReloadMessage::connected().to_json().into()))
                        .is_err()
                    {
                        continue;
                    }
                    if let Ok(mut list) = clients.lock() {
                        list.push(ws);
                    }
                }
                Err(e) => warn!(%addr, error = %e, "websocket handshake failed"),
            },
            Err(e) => {
                warn!(error = %e, "live reload accept error");
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
    }
}

/// Bind to `base_port`, walking upward when the port is in use.
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual = listener
                    .local_addr()
                    .context("reading bound websocket address")?
                    .port();
                return Ok((listener, actual));
            }
            Err(e) => {
                last_error = Some(e);
            }
        }
    }

    Err(anyhow!(
        "could not bind live reload port after {max_retries} attempts starting at {base_port}: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )
    .into())
}
