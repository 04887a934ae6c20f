//! Turns raw traversal output into persistable path records.

use crate::error::{Result, TraceError};
use crate::graph::index::GraphIndex;
use crate::types::{LinkId, Node, NodeFlag, NodeId, PathLink, PathResult, RawPath};

/// Converts [`RawPath`]s into [`PathLink`] / [`PathResult`] records.
///
/// Node attributes are denormalized from the graph at assembly time.
pub struct PathAssembler<'g> {
    graph: &'g GraphIndex,
}

impl<'g> PathAssembler<'g> {
    pub fn new(graph: &'g GraphIndex) -> Self {
        Self { graph }
    }

    /// One [`PathLink`] per hop, in traversal order.
    ///
    /// The first hop is flagged `S`, the last `E` (a single hop stays `S`),
    /// everything between `I`. `start_node_id`/`end_node_id` follow the
    /// traversal direction; `reverse` records whether that runs against the
    /// link's stored direction.
    pub fn to_path_links(&self, path: &RawPath) -> Result<Vec<PathLink>> {
        if path.node_seq.len() != path.link_seq.len() + 1 {
            return Err(TraceError::MalformedPath(format!(
                "{} nodes for {} links",
                path.node_seq.len(),
                path.link_seq.len()
            )));
        }

        let last = path.link_seq.len().saturating_sub(1);
        path.link_seq
            .iter()
            .enumerate()
            .map(|(i, hop)| {
                let link = self.graph.link(hop.link_id)?;
                let start = self.hop_node(path.node_seq[i], hop.link_id)?;
                let end = self.hop_node(path.node_seq[i + 1], hop.link_id)?;

                let node_flag = if i == 0 {
                    NodeFlag::Start
                } else if i == last {
                    NodeFlag::End
                } else {
                    NodeFlag::Intermediate
                };

                Ok(PathLink {
                    seq: i,
                    link_id: link.id,
                    length: link.cost,
                    start_node_id: start.id,
                    start_node_data_code: start.data_code,
                    start_node_utility_no: start.utility_no,
                    end_node_id: end.id,
                    end_node_data_code: end.data_code,
                    end_node_utility_no: end.utility_no,
                    reverse: hop.reverse,
                    node_flag,
                })
            })
            .collect()
    }

    /// Assemble a full record with the given 1-based ordinal.
    pub fn to_path_result(&self, ordinal: u32, path: &RawPath) -> Result<PathResult> {
        let links = self.to_path_links(path)?;
        let (Some(start_node_id), Some(end_node_id)) = (path.start(), path.terminal()) else {
            return Err(TraceError::MalformedPath("path has no nodes".into()));
        };
        Ok(PathResult {
            ordinal,
            start_node_id,
            end_node_id,
            total_cost: path.total_cost,
            endpoint: path.endpoint,
            links,
        })
    }

    fn hop_node(&self, node_id: NodeId, link_id: LinkId) -> Result<&Node> {
        self.graph
            .node(node_id)
            .map_err(|_| TraceError::DanglingLink { link_id, node_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hop, Link};
    use pretty_assertions::assert_eq as pa_eq;

    fn graph() -> GraphIndex {
        GraphIndex::build(
            vec![
                Node::new(1).with_utility(4),
                Node::new(2).with_utility(4),
                Node::new(3).with_data_code(15000).with_utility(4),
                Node::new(4).with_data_code(107).with_utility(5),
            ],
            vec![
                Link::directed(10, 1, 2, 1.0),
                Link::bidirected(11, 3, 2, 2.0),
                Link::directed(12, 3, 4, 0.5),
            ],
        )
        .unwrap()
    }

    fn hop(link_id: LinkId, reverse: bool) -> Hop {
        Hop { link_id, reverse }
    }

    fn raw(node_seq: Vec<NodeId>, link_seq: Vec<Hop>, total_cost: f64) -> RawPath {
        RawPath {
            node_seq,
            link_seq,
            total_cost,
            endpoint: None,
        }
    }

    #[test]
    fn flags_follow_position() {
        let g = graph();
        let path = raw(
            vec![1, 2, 3, 4],
            vec![hop(10, false), hop(11, true), hop(12, false)],
            3.5,
        );

        let links = PathAssembler::new(&g).to_path_links(&path).unwrap();
        let flags: Vec<NodeFlag> = links.iter().map(|l| l.node_flag).collect();
        pa_eq!(
            flags,
            vec![NodeFlag::Start, NodeFlag::Intermediate, NodeFlag::End]
        );
        let seqs: Vec<usize> = links.iter().map(|l| l.seq).collect();
        pa_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn single_hop_is_flagged_start() {
        let g = graph();
        let links = PathAssembler::new(&g)
            .to_path_links(&raw(vec![1, 2], vec![hop(10, false)], 1.0))
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].node_flag, NodeFlag::Start);
    }

    #[test]
    fn denormalizes_node_attributes_and_reverse() {
        let g = graph();
        let links = PathAssembler::new(&g)
            .to_path_links(&raw(
                vec![2, 3, 4],
                vec![hop(11, true), hop(12, false)],
                2.5,
            ))
            .unwrap();

        let first = &links[0];
        assert_eq!(first.start_node_id, 2);
        assert_eq!(first.end_node_id, 3);
        assert_eq!(first.end_node_data_code, 15000);
        assert_eq!(first.end_node_utility_no, 4);
        assert!((first.length - 2.0).abs() < f64::EPSILON);
        assert!(first.reverse);

        let second = &links[1];
        assert_eq!(second.end_node_data_code, 107);
        assert_eq!(second.end_node_utility_no, 5);
        assert!(!second.reverse);
    }

    #[test]
    fn chaining_links_reproduces_node_sequence() {
        let g = graph();
        let path = raw(
            vec![1, 2, 3, 4],
            vec![hop(10, false), hop(11, true), hop(12, false)],
            3.5,
        );
        let result = PathAssembler::new(&g).to_path_result(7, &path).unwrap();

        assert_eq!(result.ordinal, 7);
        assert_eq!(result.start_node_id, 1);
        assert_eq!(result.end_node_id, 4);
        pa_eq!(result.node_ids(), path.node_seq);
        pa_eq!(result.link_ids(), vec![10, 11, 12]);
    }

    #[test]
    fn empty_path_yields_no_links() {
        let g = graph();
        let result = PathAssembler::new(&g)
            .to_path_result(1, &RawPath::single(1))
            .unwrap();
        assert!(result.links.is_empty());
        assert_eq!(result.start_node_id, result.end_node_id);
    }

    #[test]
    fn mismatched_sequences_are_rejected() {
        let g = graph();
        let err = PathAssembler::new(&g)
            .to_path_links(&raw(vec![1, 2, 3], vec![hop(10, false)], 1.0))
            .unwrap_err();
        assert!(matches!(err, TraceError::MalformedPath(_)));
    }

    #[test]
    fn empty_path_is_rejected_not_panicking() {
        let g = graph();
        let err = PathAssembler::new(&g)
            .to_path_result(1, &raw(vec![], vec![], 0.0))
            .unwrap_err();
        assert!(matches!(err, TraceError::MalformedPath(_)));
    }

    #[test]
    fn unknown_link_is_reported() {
        let g = graph();
        let err = PathAssembler::new(&g)
            .to_path_links(&raw(vec![1, 2], vec![hop(99, false)], 1.0))
            .unwrap_err();
        assert!(matches!(err, TraceError::LinkNotFound(99)));
    }
}
