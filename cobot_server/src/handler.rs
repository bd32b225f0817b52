//! Connection handler: one reply frame per inbound text frame.
//!
//! The handler is transport-agnostic. It reads any `Stream<Item = String>`
//! in order, runs each line through the parser and the session, and writes
//! the decimal reply code to any `Sink<String>`.

use crate::command::{Command, CommandParser};
use crate::session::{DeviceSession, FAILURE_CODE};
use cobot_common::device::consts::NO_FAULT;
use cobot_common::device::types::ErrorCode;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-connection command executor. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionHandler {
    session: Arc<DeviceSession>,
    parser: CommandParser,
}

impl ConnectionHandler {
    /// Create a handler sharing `session`.
    pub fn new(session: Arc<DeviceSession>, parser: CommandParser) -> Self {
        Self { session, parser }
    }

    /// Execute one line and return its reply code.
    ///
    /// Never fails: parse errors and dispatch errors become non-zero codes.
    pub async fn execute(&self, line: &str) -> ErrorCode {
        let cmd = match self.parser.parse(line) {
            Ok(Command::NoOp) => return NO_FAULT,
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Rejected '{}': {}", line.trim(), e);
                return FAILURE_CODE;
            }
        };

        // Driver calls block for the duration of the motion.
        let session = Arc::clone(&self.session);
        match tokio::task::spawn_blocking(move || session.dispatch(&cmd)).await {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => e.code(),
            Err(e) => {
                warn!("Dispatch task failed: {}", e);
                FAILURE_CODE
            }
        }
    }

    /// Serve one connection until its inbound stream ends or the reply sink fails.
    ///
    /// Returns the number of frames handled.
    pub async fn serve<S, K>(&self, peer: impl fmt::Display, frames: S, replies: K) -> usize
    where
        S: Stream<Item = String>,
        K: Sink<String>,
        K::Error: fmt::Display,
    {
        let mut frames = std::pin::pin!(frames);
        let mut replies = std::pin::pin!(replies);
        let mut handled = 0;

        while let Some(line) = frames.next().await {
            let code = self.execute(&line).await;
            handled += 1;
            debug!("[{}] '{}' -> {}", peer, line.trim(), code);
            if let Err(e) = replies.send(code.to_string()).await {
                info!("[{}] Reply failed, closing: {}", peer, e);
                break;
            }
        }
        handled
    }
}
