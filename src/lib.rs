//! newsfetch library
//!
//! A rate-limited, cache-backed client for NewsAPI. The `newsfetch` binary is a
//! thin CLI over `client::NewsClient`.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod request;

pub use client::NewsClient;
pub use error::{ErrorKind, FetchError};
