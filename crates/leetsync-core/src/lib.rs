//! Core types and trait definitions for the leetsync catalog engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, the remote catalog client and the chat platform are all
//! expressed as traits here; every other crate depends on this one.

// Trait impls use native `async fn`; the returned futures are `Send`.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod forum;
pub mod platform;
pub mod problem;
pub mod store;

pub use error::{ParseError, Result};
