//! Tool registration and lookup.
//!
//! Tools are registered on a [`ToolRegistryBuilder`]; [`ToolRegistryBuilder::build`]
//! freezes them into a [`ToolRegistry`] that has no mutation API and can be shared
//! across sessions without locking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use figma_context::DesignFileClient;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::schema::ParamSchema;
use super::{download_figma_images, get_figma_data};

/// Executes one tool with arguments that already passed schema validation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult>;
}

/// A named, schema-described operation.
pub struct Tool {
    pub name: String,
    pub description: String,
    pub schema: ParamSchema,
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(
        name: &str,
        description: &str,
        schema: ParamSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Debug)]
pub struct ToolRegistryBuilder {
    tools: Vec<Tool>,
}

impl ToolRegistryBuilder {
    /// Add a tool. Fails if a tool with the same name is already registered.
    pub fn register(&mut self, tool: Tool) -> McpResult<&mut Self> {
        if self.tools.iter().any(|t| t.name == tool.name) {
            return Err(McpError::DuplicateTool(tool.name));
        }
        tracing::debug!("Registered tool {}", tool.name);
        self.tools.push(tool);
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        let index = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        ToolRegistry {
            tools: self.tools,
            index,
        }
    }
}

/// Immutable set of tools, shared read-only by every session.
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// The standard Figma tool set.
    pub fn figma(client: Arc<dyn DesignFileClient>) -> McpResult<Self> {
        let mut builder = Self::builder();
        builder
            .register(get_figma_data::tool(client.clone()))?
            .register(download_figma_images::tool(client))?;
        Ok(builder.build())
    }

    pub fn resolve(&self, name: &str) -> McpResult<&Tool> {
        self.index
            .get(name)
            .and_then(|&i| self.tools.get(i))
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))
    }

    /// Wire definitions in registration order.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(Tool::definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
