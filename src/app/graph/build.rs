use crate::memory::{GraphError, GraphSnapshot};

use super::super::ViewModel;

impl ViewModel {
    /// Filters `source` and hands it to the simulation. On rejection the current graph stays.
    pub(in crate::app) fn apply_snapshot(&mut self, source: GraphSnapshot) -> Result<(), GraphError> {
        let candidate = source.with_min_edge_weight(self.min_edge_weight);
        if let Err(error) = self.simulation.set_graph(&candidate) {
            self.apply_error = Some(error.to_string());
            return Err(error);
        }

        self.source = source;
        self.active = candidate;
        self.graph_revision += 1;
        self.apply_error = None;
        self.search_match_cache = None;

        if let Some(dragged) = self.interaction.dragged_node()
            && self.active.node(dragged).is_none()
        {
            self.interaction.cancel(&mut self.simulation);
        }
        if let Some(selected) = &self.selected
            && self.active.node(selected).is_none()
        {
            self.set_selected(None);
        }

        Ok(())
    }

    /// Re-applies the loaded snapshot after the edge weight threshold changed.
    pub(in crate::app) fn refilter(&mut self) {
        let source = self.source.clone();
        if let Err(error) = self.apply_snapshot(source) {
            log::warn!("edge filter produced an invalid graph: {error}");
        }
    }

    /// Result of a background (re)load. Failures keep the current graph on screen.
    pub(in crate::app) fn reload(&mut self, result: Result<GraphSnapshot, String>) {
        match result {
            Ok(graph) => {
                self.load_error = None;
                if self.apply_snapshot(graph).is_ok() {
                    log::info!(
                        "reloaded memory graph ({} nodes, {} edges)",
                        self.simulation.node_count(),
                        self.active.edge_count()
                    );
                }
            }
            Err(error) => {
                log::warn!("reload failed, keeping current graph: {error}");
                self.load_error = Some(error);
            }
        }
    }
}
