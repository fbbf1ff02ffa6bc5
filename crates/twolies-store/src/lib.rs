//! In-memory room storage for twolies.
//!
//! Rooms live in a single process-wide map. Each room carries its own
//! async mutex, so operations on one room are fully serialized while
//! different rooms proceed in parallel. A background reaper evicts
//! rooms that have sat untouched past the idle timeout.
//!
//! # Key types
//!
//! - [`RoomRepository`] — the store: lookup, locked mutation, chat, sweep
//! - [`StoreConfig`] — idle timeout and sweep interval
//! - [`StoreError`] — lookup failures plus pass-through rule rejections

mod config;
mod error;
mod repository;

pub use config::StoreConfig;
pub use error::StoreError;
pub use repository::RoomRepository;
