//! Tool: download_figma_images: Render nodes to SVG/PNG and save them locally.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;

use figma_context::{DesignFileClient, ImageFormat};

use crate::types::{McpError, McpResult, ToolCallResult};

use super::registry::{Tool, ToolHandler};
use super::schema::{FieldKind, FieldSpec, ParamSchema};

pub const NAME: &str = "download_figma_images";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadParams {
    file_key: String,
    nodes: Vec<ImageNode>,
    local_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageNode {
    node_id: String,
    file_name: String,
}

pub fn schema() -> ParamSchema {
    let node = FieldKind::Object(vec![
        FieldSpec::required("nodeId", FieldKind::String)
            .describe("The Figma ID of the node to fetch, formatted as 1234:5678"),
        FieldSpec::required("fileName", FieldKind::String)
            .describe("The local name for saving the fetched file"),
    ]);

    ParamSchema::new()
        .field(
            FieldSpec::required("fileKey", FieldKind::String)
                .describe("The key of the Figma file containing the node"),
        )
        .field(
            FieldSpec::required("nodes", FieldKind::Array(Box::new(node)))
                .describe("The nodes to fetch as images"),
        )
        .field(
            FieldSpec::required("localPath", FieldKind::String).describe(
                "The absolute path to the directory where images are stored in the project. Automatically creates directories if needed.",
            ),
        )
}

pub fn tool(client: Arc<dyn DesignFileClient>) -> Tool {
    Tool::new(
        NAME,
        "Download SVG or PNG images used in a Figma file based on the IDs of image or icon nodes",
        schema(),
        Arc::new(DownloadFigmaImages { client }),
    )
}

struct DownloadFigmaImages {
    client: Arc<dyn DesignFileClient>,
}

#[async_trait]
impl ToolHandler for DownloadFigmaImages {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult> {
        let params: DownloadParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let file_key = params.file_key.as_str();
        let local_path = Path::new(&params.local_path);

        let downloads = params.nodes.iter().map(|node| {
            tracing::info!(
                "get image \"{}\", saving to: {}",
                node.node_id,
                local_path.join(&node.file_name).display()
            );
            let format = ImageFormat::from_file_name(&node.file_name);
            async move {
                match self
                    .client
                    .get_image(file_key, &node.node_id, &node.file_name, local_path, format)
                    .await
                {
                    Ok(saved) => saved,
                    Err(e) => {
                        tracing::error!("Error downloading image {}: {e}", node.node_id);
                        false
                    }
                }
            }
        });

        let all_saved = join_all(downloads).await.into_iter().all(|saved| saved);
        Ok(ToolCallResult::text(if all_saved { "Success" } else { "Failed" }))
    }
}
