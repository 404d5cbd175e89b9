//! Shared utilities for the Issho watch-together hub.
//!
//! Holds the pieces both the server and external tooling need:
//! timestamp handling and logger setup.

pub mod logger;
pub mod time;
