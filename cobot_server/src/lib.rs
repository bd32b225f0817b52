//! # Cobot Server
//!
//! Exposes a single robotic arm to websocket clients through a small text
//! command language.
//!
//! ```text
//! transport ─► ConnectionHandler ─► CommandParser ─► DeviceSession::dispatch
//!                     ▲                                    │ (gate held)
//!                     └──────────── reply code ◄─── DeviceDriver
//! ```
//!
//! - [`command`] - Line parser producing [`command::Command`] values
//! - [`session`] - The exclusive access gate and the dispatcher
//! - [`handler`] - Per-connection frame loop
//! - [`transport`] - Websocket listener
//! - [`config`] - TOML configuration

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod session;
pub mod transport;

pub use command::{Command, CommandParser, ParseError};
pub use config::ServerConfig;
pub use error::ServerError;
pub use handler::ConnectionHandler;
pub use session::{DeviceSession, DispatchError, SessionSettings};
