//! Websocket transport.
//!
//! Accepts TCP connections, upgrades them to websockets and hands each one
//! to its own [`ConnectionHandler::serve`] task. Text frames carry command
//! lines; binary frames are accepted when they hold UTF-8. Control frames
//! are answered by the protocol layer. A close frame or read error ends the
//! connection.

use crate::error::ServerError;
use crate::handler::ConnectionHandler;
use async_tungstenite::tungstenite::{Error as WsError, Message};
use futures::future::ready;
use futures::{SinkExt, Stream, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Pause after a failed accept, so a persistent failure such as descriptor
/// exhaustion does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind the listening socket.
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on ws://{}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections forever, one task per client.
pub async fn run(listener: TcpListener, handler: ConnectionHandler) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let handler = handler.clone();
                tokio::spawn(handle_connection(handler, stream, peer));
            }
            Err(e) => accept_failed(e).await,
        }
    }
}

async fn accept_failed(e: io::Error) {
    warn!("Accept failed, retrying in {:?}: {}", ACCEPT_BACKOFF, e);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

async fn handle_connection(handler: ConnectionHandler, stream: TcpStream, peer: SocketAddr) {
    let ws = match async_tungstenite::tokio::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("[{}] Websocket handshake failed: {}", peer, e);
            return;
        }
    };
    info!("[{}] Client connected", peer);

    let (sink, inbound) = ws.split();
    let replies = sink.with(|reply: String| ready(Ok::<_, WsError>(Message::text(reply))));
    let handled = handler.serve(peer, text_frames(peer, inbound), replies).await;

    info!("[{}] Client disconnected after {} frame(s)", peer, handled);
}

/// Reduce a websocket message stream to command lines.
fn text_frames<S>(peer: SocketAddr, inbound: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<Message, WsError>>,
{
    inbound
        .take_while(move |msg| {
            ready(match msg {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    debug!("[{}] Read ended: {}", peer, e);
                    false
                }
            })
        })
        .filter_map(move |msg| {
            ready(match msg {
                Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Some(text),
                    Err(_) => {
                        warn!("[{}] Dropping non-UTF-8 binary frame ({} bytes)", peer, bytes.len());
                        None
                    }
                },
                _ => None,
            })
        })
}
