//! Reduce raw Figma node trees to the [`SimplifiedDesign`] model.

use serde_json::Value;

use crate::api::{FileResponse, Node, NodesResponse};
use crate::types::{BoundingBox, GlobalVars, SimplifiedDesign, SimplifiedNode};

/// Simplify a whole-file response. Top-level nodes are the file's pages.
pub fn simplify_file(file: FileResponse) -> SimplifiedDesign {
    let mut global_vars = GlobalVars::default();
    let nodes = file
        .document
        .children
        .unwrap_or_default()
        .iter()
        .filter_map(|n| simplify_node(n, &mut global_vars))
        .collect();

    SimplifiedDesign {
        name: file.name,
        last_modified: file.last_modified,
        thumbnail_url: file.thumbnail_url,
        nodes,
        global_vars,
    }
}

/// Simplify a nodes response. Unresolved ids (`null` entries) are skipped.
pub fn simplify_nodes(response: NodesResponse) -> SimplifiedDesign {
    let mut global_vars = GlobalVars::default();

    let mut entries: Vec<_> = response.nodes.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let nodes = entries
        .iter()
        .filter_map(|(_, entry)| entry.as_ref())
        .filter_map(|entry| simplify_node(&entry.document, &mut global_vars))
        .collect();

    SimplifiedDesign {
        name: response.name,
        last_modified: response.last_modified,
        thumbnail_url: response.thumbnail_url,
        nodes,
        global_vars,
    }
}

fn simplify_node(node: &Node, vars: &mut GlobalVars) -> Option<SimplifiedNode> {
    if node.visible == Some(false) {
        return None;
    }

    let children: Vec<SimplifiedNode> = node
        .children
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|c| simplify_node(c, vars))
        .collect();

    Some(SimplifiedNode {
        id: node.id.clone(),
        name: node.name.clone(),
        node_type: node.node_type.clone(),
        text: node.characters.clone(),
        bounding_box: node.absolute_bounding_box.map(|r| BoundingBox {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }),
        fills: intern_paints(node.fills.as_deref(), "fill", vars),
        strokes: intern_paints(node.strokes.as_deref(), "stroke", vars),
        opacity: node.opacity.filter(|o| *o < 1.0),
        border_radius: node
            .corner_radius
            .filter(|r| *r > 0.0)
            .map(|r| format!("{r}px")),
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    })
}

/// Store visible paints in `globalVars.styles`, reusing the key of an identical entry.
fn intern_paints(paints: Option<&[Value]>, prefix: &str, vars: &mut GlobalVars) -> Option<String> {
    let visible: Vec<Value> = paints?
        .iter()
        .filter(|p| p.get("visible").and_then(Value::as_bool) != Some(false))
        .cloned()
        .collect();

    if visible.is_empty() {
        return None;
    }

    let value = Value::Array(visible);
    if let Some((key, _)) = vars.styles.iter().find(|(_, v)| **v == value) {
        return Some(key.clone());
    }

    let key = format!("{prefix}_{}", vars.styles.len() + 1);
    vars.styles.insert(key.clone(), value);
    Some(key)
}
