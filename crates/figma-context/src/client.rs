//! Figma REST client and the [`DesignFileClient`] seam the MCP tools depend on.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::api::{FileResponse, ImagesResponse, NodesResponse};
use crate::simplify::{simplify_file, simplify_nodes};
use crate::types::{FigmaError, FigmaResult, ImageFormat, SimplifiedDesign};

/// Public Figma REST endpoint.
pub const FIGMA_API_BASE: &str = "https://api.figma.com/v1";

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Operations the MCP tools need from a design-file backend.
#[async_trait]
pub trait DesignFileClient: Send + Sync {
    /// Fetch and simplify a whole file.
    async fn get_file(&self, file_key: &str, depth: Option<u32>) -> FigmaResult<SimplifiedDesign>;

    /// Fetch and simplify a single node subtree.
    async fn get_node(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> FigmaResult<SimplifiedDesign>;

    /// Render a node and save it as `local_path/file_name`.
    ///
    /// Returns `Ok(false)` when Figma could not render the node or the download failed.
    async fn get_image(
        &self,
        file_key: &str,
        node_id: &str,
        file_name: &str,
        local_path: &Path,
        format: ImageFormat,
    ) -> FigmaResult<bool>;
}

/// [`DesignFileClient`] backed by the Figma REST API.
#[derive(Clone)]
pub struct FigmaService {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl FigmaService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, FIGMA_API_BASE)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FigmaResult<T> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header("X-Figma-Token", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FigmaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn download(&self, url: &str, destination: &Path) -> FigmaResult<bool> {
        let response = match self.http.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("Image download returned {} for {url}", r.status());
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!("Image download failed for {url}: {e}");
                return Ok(false);
            }
        };

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Image body read failed for {url}: {e}");
                return Ok(false);
            }
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        tracing::debug!("Saved {} bytes to {}", bytes.len(), destination.display());
        Ok(true)
    }
}

fn depth_query(depth: Option<u32>) -> Vec<(&'static str, String)> {
    depth.map(|d| ("depth", d.to_string())).into_iter().collect()
}

#[async_trait]
impl DesignFileClient for FigmaService {
    async fn get_file(&self, file_key: &str, depth: Option<u32>) -> FigmaResult<SimplifiedDesign> {
        let file: FileResponse = self
            .request(&format!("/files/{file_key}"), &depth_query(depth))
            .await?;
        Ok(simplify_file(file))
    }

    async fn get_node(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> FigmaResult<SimplifiedDesign> {
        let mut query = vec![("ids", node_id.to_string())];
        query.extend(depth_query(depth));

        let response: NodesResponse = self
            .request(&format!("/files/{file_key}/nodes"), &query)
            .await?;

        if !matches!(response.nodes.get(node_id), Some(Some(_))) {
            return Err(FigmaError::NodeNotFound(node_id.to_string()));
        }

        Ok(simplify_nodes(response))
    }

    async fn get_image(
        &self,
        file_key: &str,
        node_id: &str,
        file_name: &str,
        local_path: &Path,
        format: ImageFormat,
    ) -> FigmaResult<bool> {
        let query = [
            ("ids", node_id.to_string()),
            ("format", format.as_str().to_string()),
        ];
        let images: ImagesResponse = self
            .request(&format!("/images/{file_key}"), &query)
            .await?;

        if let Some(err) = images.err {
            tracing::warn!("Figma could not render {node_id}: {err}");
            return Ok(false);
        }

        let Some(url) = images.images.get(node_id).cloned().flatten() else {
            tracing::warn!("No image URL returned for node {node_id}");
            return Ok(false);
        };

        self.download(&url, &local_path.join(file_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_body() -> serde_json::Value {
        json!({
            "name": "Landing",
            "lastModified": "2024-05-01T10:00:00Z",
            "thumbnailUrl": "https://example.com/thumb.png",
            "document": {
                "id": "0:0",
                "name": "Document",
                "type": "DOCUMENT",
                "children": [{ "id": "0:1", "name": "Page 1", "type": "CANVAS" }]
            }
        })
    }

    #[tokio::test]
    async fn test_get_file_sends_token_and_depth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/ABC123"))
            .and(header("X-Figma-Token", "secret"))
            .and(query_param("depth", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_body()))
            .expect(1)
            .mount(&server)
            .await;

        let service = FigmaService::with_base_url("secret", server.uri());
        let design = service.get_file("ABC123", Some(2)).await.unwrap();

        assert_eq!(design.name, "Landing");
        assert_eq!(design.nodes.len(), 1);
        assert_eq!(design.nodes[0].id, "0:1");
    }

    #[tokio::test]
    async fn test_api_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/NOPE"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Invalid token"))
            .mount(&server)
            .await;

        let service = FigmaService::with_base_url("bad", server.uri());
        let err = service.get_file("NOPE", None).await.unwrap_err();

        match err {
            FigmaError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Invalid token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_node_missing_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/ABC123/nodes"))
            .and(query_param("ids", "9:9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Landing",
                "lastModified": "",
                "thumbnailUrl": "",
                "nodes": { "9:9": null }
            })))
            .mount(&server)
            .await;

        let service = FigmaService::with_base_url("secret", server.uri());
        let err = service.get_node("ABC123", "9:9", None).await.unwrap_err();
        assert!(matches!(err, FigmaError::NodeNotFound(id) if id == "9:9"));
    }

    #[tokio::test]
    async fn test_get_image_downloads_to_local_path() {
        let server = MockServer::start().await;
        let image_url = format!("{}/render/icon.svg", server.uri());

        Mock::given(method("GET"))
            .and(path("/images/ABC123"))
            .and(query_param("format", "svg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "err": null,
                "images": { "1:2": image_url }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/render/icon.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg/>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("assets");
        let service = FigmaService::with_base_url("secret", server.uri());

        let saved = service
            .get_image("ABC123", "1:2", "icon.svg", &target, ImageFormat::Svg)
            .await
            .unwrap();

        assert!(saved);
        let written = std::fs::read_to_string(target.join("icon.svg")).unwrap();
        assert_eq!(written, "<svg/>");
    }

    #[tokio::test]
    async fn test_get_image_without_url_returns_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/ABC123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": { "1:2": null }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = FigmaService::with_base_url("secret", server.uri());
        let saved = service
            .get_image("ABC123", "1:2", "icon.png", dir.path(), ImageFormat::Png)
            .await
            .unwrap();

        assert!(!saved);
        assert!(!dir.path().join("icon.png").exists());
    }
}
