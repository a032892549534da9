//! Adapters implementing domain ports.
//!
//! Storage backends for [`crate::ports::AgentRepository`]. Adapters depend on
//! the ports, never the other way around.

pub mod in_memory_repository;
pub mod msgpack_repository;

pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;
