//! Builds a browsable phylogenetic tree from a [`SpeciesRegistry`] and
//! exports it to Graphviz DOT, for offline inspection of how species
//! diverged over a run.

use petgraph::graph::{DiGraph, NodeIndex};
use primordium_core::species_registry::{SpeciesFilter, SpeciesRegistry};
use std::collections::HashMap;
use uuid::Uuid;

/// A node in the species tree: one registered species, living or extinct.
pub struct SpeciesNode {
    pub species_id: Uuid,
    pub scientific_name: String,
    pub generation: u32,
    pub population_count: u64,
    pub extinct: bool,
}

/// The full species divergence graph, built from `parent_species_id`
/// pointers in a [`SpeciesRegistry`].
pub struct SpeciesTree {
    pub graph: DiGraph<SpeciesNode, ()>,
    id_map: HashMap<Uuid, NodeIndex>,
}

impl Default for SpeciesTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_map: HashMap::new(),
        }
    }

    /// Builds the tree from every record in `registry`, then wires up
    /// parent-to-child edges.
    #[must_use]
    pub fn build(registry: &SpeciesRegistry) -> Self {
        let mut tree = Self::new();

        for record in registry.list(SpeciesFilter::All) {
            let node = SpeciesNode {
                species_id: record.species_id,
                scientific_name: record.scientific_name.clone(),
                generation: record.generation,
                population_count: record.population_count,
                extinct: record.extinct,
            };
            let idx = tree.graph.add_node(node);
            tree.id_map.insert(record.species_id, idx);
        }

        for record in registry.list(SpeciesFilter::All) {
            if let Some(parent_id) = record.parent_species_id {
                if let (Some(&parent_idx), Some(&child_idx)) =
                    (tree.id_map.get(&parent_id), tree.id_map.get(&record.species_id))
                {
                    tree.graph.add_edge(parent_idx, child_idx, ());
                }
            }
        }

        tree
    }

    /// Exports the tree to Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph SpeciesTree {\n");
        dot.push_str("  node [shape=box, style=filled, fontname=\"Arial\"];\n");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let fill = if node.extinct { "#eeeeee" } else { "#e1f5fe" };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{} (Gen {})\\nPop: {}\", fillcolor=\"{}\"];\n",
                node.species_id, node.scientific_name, node.generation, node.population_count, fill
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    self.graph[from].species_id, self.graph[to].species_id
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn builds_an_edge_between_parent_and_child_species() {
        let mut registry = SpeciesRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let parent = Uuid::new_v4();
        let child = Uuid::new_v4();

        registry.register(
            parent,
            primordium_data::OrganismType::Herbivore,
            None,
            "Parentus herbivorus".to_string(),
            "ancestral grazer".to_string(),
            10,
            Utc::now(),
            &mut rng,
        );
        registry.register(
            child,
            primordium_data::OrganismType::Herbivore,
            Some(parent),
            "Childus herbivorus".to_string(),
            "descendant grazer".to_string(),
            5,
            Utc::now(),
            &mut rng,
        );

        let tree = SpeciesTree::build(&registry);
        assert_eq!(tree.graph.node_count(), 2);
        assert_eq!(tree.graph.edge_count(), 1);
        assert!(tree.to_dot().contains("Childus herbivorus"));
    }
}
