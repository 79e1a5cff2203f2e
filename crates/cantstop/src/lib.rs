//! # Can't Stop
//!
//! Real-time backend for the Can't Stop dice game.
//!
//! Browsers connect over WebSocket, pick a username, gather in rooms,
//! and play. Each running game is an isolated actor task; this crate
//! ties the layers together: transport → protocol → lobby → game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cantstop::CantStopServer;
//!
//! # async fn run() -> Result<(), cantstop::CantStopError> {
//! let server = CantStopServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use cantstop_lobby::LobbyConfig;
pub use error::CantStopError;
pub use server::{CantStopServer, CantStopServerBuilder, DEFAULT_ADDR};
