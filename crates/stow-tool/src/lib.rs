//! Tool invocation adapter for Stowage.
//!
//! Wraps an external tool executor (an MCP server, a model call) so that
//! every invocation leaves a trail in a [`Provider`](stow_provider::Provider):
//! the input and output payloads are stored as content, and the invocation
//! itself is tracked as a task of type `"tool"` moving from `running` to
//! `done` or `failed`.

pub mod error;
pub mod invoker;
pub mod render;
pub mod runner;

pub use error::{ToolError, ToolResult};
pub use invoker::{InvokeError, ToolInvoker};
pub use render::{describe_input, render_error};
pub use runner::{ToolRun, ToolRunner};
