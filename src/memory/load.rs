use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::graph::GraphSnapshot;

/// Reads a `{nodes, edges}` JSON document and validates it before handing it out.
pub fn load_graph_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph snapshot {}", path.display()))?;
    let snapshot = parse_graph_snapshot(&raw)
        .with_context(|| format!("failed to parse graph snapshot {}", path.display()))?;

    log::info!(
        "loaded graph snapshot {} ({} nodes, {} edges)",
        path.display(),
        snapshot.node_count(),
        snapshot.edge_count()
    );
    Ok(snapshot)
}

pub fn parse_graph_snapshot(raw: &str) -> Result<GraphSnapshot> {
    let snapshot: GraphSnapshot = serde_json::from_str(raw).context("invalid graph JSON")?;
    snapshot
        .resolve()
        .context("graph snapshot failed validation")?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "nodes": [
                    {{"id": "a", "label": "Alpha", "type": "Entity"}},
                    {{"id": "b", "label": "Beta", "type": "Context", "properties": {{"source": "chat"}}}}
                ],
                "edges": [{{"id": "e1", "source": "a", "target": "b", "label": "has_context"}}]
            }}"#
        )
        .unwrap();

        let snapshot = load_graph_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(snapshot.edges[0].weight, 1.0);
        assert_eq!(snapshot.nodes[1].properties["source"], "chat");
    }

    #[test]
    fn dangling_reference_is_reported_in_context_chain() {
        let raw = r#"{"nodes":[{"id":"a","type":"Entity"}],"edges":[{"id":"e1","source":"a","target":"zz"}]}"#;
        let error = parse_graph_snapshot(raw).unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("failed validation"));
        assert!(message.contains("e1"));
    }

    #[test]
    fn missing_file_mentions_path() {
        let error = load_graph_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }
}
