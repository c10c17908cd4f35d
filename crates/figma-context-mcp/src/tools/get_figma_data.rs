//! Tool: get_figma_data: Fetch the simplified layout of a Figma file or node.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use figma_context::{DesignFileClient, SimplifiedDesign};

use crate::types::{McpError, McpResult, ToolCallResult};

use super::registry::{Tool, ToolHandler};
use super::schema::{FieldKind, FieldSpec, ParamSchema};

pub const NAME: &str = "get_figma_data";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDataParams {
    file_key: String,
    #[serde(default)]
    node_id: Option<String>,
    #[serde(default)]
    depth: Option<u32>,
}

pub fn schema() -> ParamSchema {
    ParamSchema::new()
        .field(
            FieldSpec::required("fileKey", FieldKind::String).describe(
                "The key of the Figma file to fetch, often found in a provided URL like figma.com/(file|design)/<fileKey>/...",
            ),
        )
        .field(
            FieldSpec::optional("nodeId", FieldKind::String).describe(
                "The ID of the node to fetch, often found as URL parameter node-id=<nodeId>, always use if provided",
            ),
        )
        .field(
            FieldSpec::optional("depth", FieldKind::Count).describe(
                "How many levels deep to traverse the node tree, only use if explicitly requested by the user",
            ),
        )
}

pub fn tool(client: Arc<dyn DesignFileClient>) -> Tool {
    Tool::new(
        NAME,
        "When the nodeId cannot be obtained, obtain the layout information about the entire Figma file",
        schema(),
        Arc::new(GetFigmaData { client }),
    )
}

struct GetFigmaData {
    client: Arc<dyn DesignFileClient>,
}

#[async_trait]
impl ToolHandler for GetFigmaData {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult> {
        let params: GetDataParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        // An empty nodeId means the whole file.
        let node_id = params.node_id.as_deref().filter(|id| !id.is_empty());

        tracing::info!(
            "Fetching {} of {} {}",
            params
                .depth
                .map_or_else(|| "all layers".to_string(), |d| format!("{d} layers deep")),
            node_id.map_or_else(|| "full file".to_string(), |id| format!("node {id} from file")),
            params.file_key
        );

        let fetched = match node_id {
            Some(node_id) => {
                self.client
                    .get_node(&params.file_key, node_id, params.depth)
                    .await
            }
            None => self.client.get_file(&params.file_key, params.depth).await,
        };

        let design = match fetched {
            Ok(design) => design,
            Err(e) => {
                tracing::error!("Error fetching file {}: {e}", params.file_key);
                return Ok(ToolCallResult::error(format!("Error fetching file: {e}")));
            }
        };

        tracing::info!("Successfully fetched file: {}", design.name);
        Ok(ToolCallResult::text(render_design(&design)?))
    }
}

/// Split a design into `{ metadata, nodes, globalVars }`, where `metadata`
/// holds every top-level field other than the two lifted out.
pub fn render_design(design: &SimplifiedDesign) -> McpResult<String> {
    let mut metadata = serde_json::to_value(design)?;
    let fields = metadata
        .as_object_mut()
        .ok_or_else(|| McpError::InternalError("design did not serialize to an object".into()))?;
    let nodes = fields.remove("nodes").unwrap_or_else(|| json!([]));
    let global_vars = fields.remove("globalVars").unwrap_or_else(|| json!({}));

    let rendered = json!({
        "metadata": metadata,
        "nodes": nodes,
        "globalVars": global_vars,
    });
    Ok(serde_json::to_string_pretty(&rendered)?)
}
