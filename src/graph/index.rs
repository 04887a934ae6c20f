//! Read-only adjacency index over a node/link snapshot.
//!
//! Nodes and links are stored in id-keyed maps; adjacency entries hold ids
//! only. A bidirected link produces two entries, the second one flagged as
//! walking the link in reverse.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::{Result, TraceError};
use crate::types::{Hop, Link, LinkId, Node, NodeId};

/// One outgoing adjacency entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacent {
    pub link_id: LinkId,
    pub neighbor: NodeId,
    pub cost: f64,
    /// Entry created for the end→start direction of a bidirected link.
    pub reverse: bool,
}

impl Adjacent {
    pub fn hop(&self) -> Hop {
        Hop {
            link_id: self.link_id,
            reverse: self.reverse,
        }
    }
}

/// Immutable graph snapshot shared by every traversal.
///
/// Safe to share across threads; nothing mutates it after [`GraphIndex::build`].
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkId, Link>,
    adjacency: HashMap<NodeId, Vec<Adjacent>>,
    fingerprint: String,
}

impl GraphIndex {
    /// Build the index.
    ///
    /// Links whose endpoints are missing are accepted here; the traversal
    /// that dereferences them fails with [`TraceError::DanglingLink`].
    /// Negative or non-finite costs are rejected, as are duplicate ids.
    pub fn build(
        nodes: impl IntoIterator<Item = Node>,
        links: impl IntoIterator<Item = Link>,
    ) -> Result<Self> {
        let mut node_map: HashMap<NodeId, Node> = HashMap::new();
        for node in nodes {
            let id = node.id;
            if node_map.insert(id, node).is_some() {
                return Err(TraceError::DuplicateNode(id));
            }
        }

        let mut link_map: HashMap<LinkId, Link> = HashMap::new();
        let mut adjacency: HashMap<NodeId, Vec<Adjacent>> = HashMap::new();
        for link in links {
            if !link.cost.is_finite() || link.cost < 0.0 {
                return Err(TraceError::InvalidCost {
                    link_id: link.id,
                    cost: link.cost,
                });
            }
            if link_map.contains_key(&link.id) {
                return Err(TraceError::DuplicateLink(link.id));
            }

            adjacency.entry(link.start_node_id).or_default().push(Adjacent {
                link_id: link.id,
                neighbor: link.end_node_id,
                cost: link.cost,
                reverse: false,
            });
            if link.is_bidirected {
                adjacency.entry(link.end_node_id).or_default().push(Adjacent {
                    link_id: link.id,
                    neighbor: link.start_node_id,
                    cost: link.cost,
                    reverse: true,
                });
            }
            link_map.insert(link.id, link);
        }

        let dangling = link_map
            .values()
            .filter(|l| {
                !node_map.contains_key(&l.start_node_id) || !node_map.contains_key(&l.end_node_id)
            })
            .count();
        if dangling > 0 {
            tracing::warn!(dangling, "graph contains links to unknown nodes");
        }

        let fingerprint = fingerprint(&node_map, &link_map);
        tracing::debug!(
            nodes = node_map.len(),
            links = link_map.len(),
            connected = adjacency.len(),
            "built graph index"
        );

        Ok(Self {
            nodes: node_map,
            links: link_map,
            adjacency,
            fingerprint,
        })
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(TraceError::NodeNotFound(id))
    }

    /// Look up a link by id.
    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.links.get(&id).ok_or(TraceError::LinkNotFound(id))
    }

    /// Resolve the node an adjacency entry points at.
    pub fn neighbor_node(&self, adj: &Adjacent) -> Result<&Node> {
        self.nodes.get(&adj.neighbor).ok_or(TraceError::DanglingLink {
            link_id: adj.link_id,
            node_id: adj.neighbor,
        })
    }

    /// Outgoing adjacency of `id`, in link insertion order.
    pub fn neighbors(&self, id: NodeId) -> &[Adjacent] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Hex SHA-256 over the sorted snapshot contents.
    ///
    /// Equal snapshots share a fingerprint regardless of input order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(nodes: &HashMap<NodeId, Node>, links: &HashMap<LinkId, Link>) -> String {
    let mut hasher = Sha256::new();

    let mut node_ids: Vec<&NodeId> = nodes.keys().collect();
    node_ids.sort_unstable();
    for id in node_ids {
        let n = &nodes[id];
        hasher.update(n.id.to_le_bytes());
        hasher.update(n.data_code.to_le_bytes());
        hasher.update(n.utility_no.to_le_bytes());
        hasher.update(n.toolset_id.to_le_bytes());
        hasher.update((n.eq_poc_no.len() as u64).to_le_bytes());
        hasher.update(n.eq_poc_no.as_bytes());
    }

    let mut link_ids: Vec<&LinkId> = links.keys().collect();
    link_ids.sort_unstable();
    for id in link_ids {
        let l = &links[id];
        hasher.update(l.id.to_le_bytes());
        hasher.update(l.start_node_id.to_le_bytes());
        hasher.update(l.end_node_id.to_le_bytes());
        hasher.update([u8::from(l.is_bidirected)]);
        hasher.update(l.cost.to_bits().to_le_bytes());
    }

    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> GraphIndex {
        GraphIndex::build(
            vec![Node::new(1), Node::new(2), Node::new(3)],
            vec![Link::directed(10, 1, 2, 1.0), Link::bidirected(11, 2, 3, 2.0)],
        )
        .unwrap()
    }

    #[test]
    fn directed_link_registers_forward_entry_only() {
        let g = chain();
        assert_eq!(g.neighbors(1).len(), 1);
        assert_eq!(g.neighbors(1)[0].neighbor, 2);
        assert!(!g.neighbors(1)[0].reverse);
        // 2 has no entry back to 1
        assert!(g.neighbors(2).iter().all(|a| a.neighbor != 1));
    }

    #[test]
    fn bidirected_link_registers_both_directions() {
        let g = chain();
        let forward = g.neighbors(2).iter().find(|a| a.link_id == 11).unwrap();
        assert_eq!(forward.neighbor, 3);
        assert!(!forward.reverse);

        let back = g.neighbors(3).iter().find(|a| a.link_id == 11).unwrap();
        assert_eq!(back.neighbor, 2);
        assert!(back.reverse);
    }

    #[test]
    fn rejects_negative_cost() {
        let err = GraphIndex::build(
            vec![Node::new(1), Node::new(2)],
            vec![Link::directed(5, 1, 2, -0.5)],
        )
        .unwrap_err();
        assert!(matches!(err, TraceError::InvalidCost { link_id: 5, .. }));
    }

    #[test]
    fn rejects_nan_cost() {
        let err = GraphIndex::build(vec![Node::new(1)], vec![Link::directed(5, 1, 1, f64::NAN)])
            .unwrap_err();
        assert!(matches!(err, TraceError::InvalidCost { .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = GraphIndex::build(vec![Node::new(1), Node::new(1)], vec![]).unwrap_err();
        assert!(matches!(err, TraceError::DuplicateNode(1)));

        let err = GraphIndex::build(
            vec![Node::new(1), Node::new(2)],
            vec![Link::directed(5, 1, 2, 1.0), Link::directed(5, 2, 1, 1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, TraceError::DuplicateLink(5)));
    }

    #[test]
    fn dangling_links_are_accepted_at_build() {
        let g = GraphIndex::build(vec![Node::new(1)], vec![Link::directed(7, 1, 99, 1.0)]).unwrap();
        let adj = g.neighbors(1)[0];
        let err = g.neighbor_node(&adj).unwrap_err();
        assert!(matches!(
            err,
            TraceError::DanglingLink {
                link_id: 7,
                node_id: 99
            }
        ));
    }

    #[test]
    fn lookups_report_missing_ids() {
        let g = chain();
        assert!(matches!(g.node(42), Err(TraceError::NodeNotFound(42))));
        assert!(matches!(g.link(42), Err(TraceError::LinkNotFound(42))));
        assert!(g.neighbors(42).is_empty());
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.link_count(), 2);
    }

    #[test]
    fn fingerprint_ignores_input_order() {
        let a = chain();
        let b = GraphIndex::build(
            vec![Node::new(3), Node::new(1), Node::new(2)],
            vec![Link::bidirected(11, 2, 3, 2.0), Link::directed(10, 1, 2, 1.0)],
        )
        .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_tracks_costs() {
        let a = chain();
        let b = GraphIndex::build(
            vec![Node::new(1), Node::new(2), Node::new(3)],
            vec![Link::directed(10, 1, 2, 1.0), Link::bidirected(11, 2, 3, 2.5)],
        )
        .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
