//! Storage backends implementing the adapter contract

pub mod memory;

pub use memory::MemoryAdapter;
