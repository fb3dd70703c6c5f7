pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod menu;
pub mod tools;

pub use errors::{NetworkFailure, ToolError};
pub use tools::{ImageSize, ToolKind, ToolOptions, ToolRequest, ToolResult};
