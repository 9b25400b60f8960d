// ABOUTME: Core types and utilities shared across the IVM workspace
// ABOUTME: Foundational package providing the ICode data model and id generation

pub mod types;
pub mod utils;

// Re-export main types
pub use types::{ExecutionResult, ICode, ICodeStatus, InvalidStatus, Request, RequestKind};

// Re-export utilities
pub use utils::generate_icode_id;
