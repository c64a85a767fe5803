/// EVM JSON-RPC Mock Server Library
///
/// This crate provides both a standalone binary and library components
/// for answering Multicall3 balance reads from an in-memory table.

pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, serve};
pub use state::MockChain;
pub use types::*;
