//! Figma Context: Figma REST client, simplified design model, and image downloads.

pub mod api;
pub mod client;
pub mod simplify;
pub mod types;

pub use client::{DesignFileClient, FigmaService, FIGMA_API_BASE};
pub use simplify::{simplify_file, simplify_nodes};
pub use types::*;
