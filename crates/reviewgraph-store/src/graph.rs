//! Directed graph projection of the triple store using petgraph.
//!
//! Only forward predicates become edges; inverses would just double every
//! edge. Node kinds follow from the predicate position (a `sold_in` object is
//! a location, a `purchased` subject is a person, and so on).

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::predicate::Predicate;
use crate::triples::TripleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Product,
    Brand,
    Location,
    Person,
    Sentiment,
    Problem,
}

impl NodeKind {
    /// Kinds of the (subject, object) ends of a forward predicate.
    fn ends(predicate: Predicate) -> Option<(NodeKind, NodeKind)> {
        match predicate {
            Predicate::IsBrandOf => Some((NodeKind::Product, NodeKind::Brand)),
            Predicate::SoldIn => Some((NodeKind::Product, NodeKind::Location)),
            Predicate::Purchased => Some((NodeKind::Person, NodeKind::Product)),
            Predicate::HasSentiment => Some((NodeKind::Product, NodeKind::Sentiment)),
            Predicate::HasProblem => Some((NodeKind::Product, NodeKind::Problem)),
            _ => None,
        }
    }
}

/// A node in the entity graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: String,
    pub kind: NodeKind,
}

/// An entity with its total (in + out) degree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub label: String,
    pub kind: NodeKind,
    pub degree: usize,
}

/// One edge touching a looked-up entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub kind: NodeKind,
    pub predicate: Predicate,
    /// True when the entity is the edge's source.
    pub outgoing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub by_kind: BTreeMap<NodeKind, usize>,
}

/// Entity graph built from a triple store.
pub struct EntityGraph {
    graph: DiGraph<GraphNode, Predicate>,
    node_index: HashMap<String, NodeIndex>,
}

impl EntityGraph {
    /// Graph over every forward predicate.
    pub fn build(store: &TripleStore) -> Self {
        Self::subgraph(store, Predicate::forward())
    }

    /// Graph restricted to the given predicates (inverse predicates are ignored).
    pub fn subgraph(store: &TripleStore, predicates: &[Predicate]) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        };
        for &predicate in predicates {
            let Some((subject_kind, object_kind)) = NodeKind::ends(predicate) else {
                continue;
            };
            for triple in store.query(None, Some(predicate), None) {
                let from = graph.node(&triple.subject, subject_kind);
                let to = graph.node(&triple.object, object_kind);
                graph.graph.add_edge(from, to, predicate);
            }
        }
        graph
    }

    /// Products and the sentiment labels attached to them.
    pub fn sentiment_network(store: &TripleStore) -> Self {
        Self::subgraph(store, &[Predicate::HasSentiment])
    }

    /// Products with their brands and problems.
    pub fn product_network(store: &TripleStore) -> Self {
        Self::subgraph(store, &[Predicate::IsBrandOf, Predicate::HasProblem])
    }

    // A label keeps the kind it was first seen with
    fn node(&mut self, label: &str, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            label: label.to_string(),
            kind,
        });
        self.node_index.insert(label.to_string(), idx);
        idx
    }

    pub fn stats(&self) -> GraphStats {
        let mut by_kind = BTreeMap::new();
        for node in self.graph.node_weights() {
            *by_kind.entry(node.kind).or_insert(0) += 1;
        }
        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            by_kind,
        }
    }

    /// The `n` best-connected entities, by degree descending then label.
    pub fn top_entities(&self, n: usize) -> Vec<RankedEntity> {
        let mut ranked: Vec<RankedEntity> = self
            .graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                RankedEntity {
                    label: node.label.clone(),
                    kind: node.kind,
                    degree: self.degree(idx),
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.label.cmp(&b.label)));
        ranked.truncate(n);
        ranked
    }

    fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
            + self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Edges touching `entity`, outgoing first, each group sorted by label.
    /// Unknown entities have no neighbors.
    pub fn neighbors(&self, entity: &str) -> Vec<Neighbor> {
        let Some(&idx) = self.node_index.get(entity) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (direction, outgoing) in [(Direction::Outgoing, true), (Direction::Incoming, false)] {
            let mut group: Vec<Neighbor> = self
                .graph
                .edges_directed(idx, direction)
                .map(|edge| {
                    let other = if outgoing { edge.target() } else { edge.source() };
                    let node = &self.graph[other];
                    Neighbor {
                        label: node.label.clone(),
                        kind: node.kind,
                        predicate: *edge.weight(),
                        outgoing,
                    }
                })
                .collect();
            group.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.predicate.cmp(&b.predicate)));
            out.extend(group);
        }
        out
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.node_index.contains_key(entity)
    }
}
