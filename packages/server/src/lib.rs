//! Watch-together synchronization hub.
//!
//! Tracks rooms, relays playback state under host authority, and fans out
//! presence and chat messages to room members over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
