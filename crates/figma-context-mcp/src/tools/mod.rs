//! MCP tool implementations.

pub mod download_figma_images;
pub mod get_figma_data;
pub mod registry;
pub mod schema;

pub use registry::{Tool, ToolHandler, ToolRegistry, ToolRegistryBuilder};
pub use schema::{FieldKind, FieldSpec, ParamSchema};
