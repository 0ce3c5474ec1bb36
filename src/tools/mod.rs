//! Tools module - tools the agents may call
//!
//! Contains the web search tool and the tool registry.

pub mod registry;
pub mod search;

pub use registry::ToolRegistry;
pub use search::{SerperSearch, WebSearch};
