//! Core domain types for nettrace.
//!
//! Nodes and links are the graph snapshot handed in by the loading layer;
//! `RawPath` is what the traversals produce, and `PathResult`/`PathLink`
//! are the records handed back for persistence.

use serde::{Deserialize, Serialize};

/// Integer key of a node.
pub type NodeId = i64;

/// Integer key of a link.
pub type LinkId = i64;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A point in the facility network (equipment or junction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Classification code, matched against target codes.
    #[serde(default)]
    pub data_code: i64,
    /// Utility network this node belongs to.
    #[serde(default)]
    pub utility_no: i64,
    #[serde(default)]
    pub toolset_id: i64,
    #[serde(default)]
    pub toolset_code: String,
    /// Free-text point-of-contact label, may hold several comma-separated codes.
    #[serde(default)]
    pub eq_poc_no: String,
}

impl Node {
    /// A bare node with every attribute zeroed.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            data_code: 0,
            utility_no: 0,
            toolset_id: 0,
            toolset_code: String::new(),
            eq_poc_no: String::new(),
        }
    }

    pub fn with_data_code(mut self, data_code: i64) -> Self {
        self.data_code = data_code;
        self
    }

    pub fn with_utility(mut self, utility_no: i64) -> Self {
        self.utility_no = utility_no;
        self
    }

    pub fn with_toolset(mut self, toolset_id: i64, toolset_code: impl Into<String>) -> Self {
        self.toolset_id = toolset_id;
        self.toolset_code = toolset_code.into();
        self
    }

    pub fn with_poc(mut self, eq_poc_no: impl Into<String>) -> Self {
        self.eq_poc_no = eq_poc_no.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// A physical connector between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
    /// Traversable end→start as well as start→end.
    #[serde(default)]
    pub is_bidirected: bool,
    pub cost: f64,
}

impl Link {
    /// A one-way link.
    pub fn directed(id: LinkId, start: NodeId, end: NodeId, cost: f64) -> Self {
        Self {
            id,
            start_node_id: start,
            end_node_id: end,
            is_bidirected: false,
            cost,
        }
    }

    /// A link traversable in both directions.
    pub fn bidirected(id: LinkId, start: NodeId, end: NodeId, cost: f64) -> Self {
        Self {
            is_bidirected: true,
            ..Self::directed(id, start, end, cost)
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointKind
// ---------------------------------------------------------------------------

/// Why a path stopped where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// The node has no adjacency at all.
    Leaf,
    /// The node's data code is one of the target codes.
    Target,
    /// The node has adjacency, but none of it survives filtering.
    Boundary,
    /// The enumerator reached its depth cap.
    DepthCap,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Target => "target",
            Self::Boundary => "boundary",
            Self::DepthCap => "depth_cap",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawPath
// ---------------------------------------------------------------------------

/// One traversed link, remembering the direction it was walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub link_id: LinkId,
    /// Walked end→start relative to the link's stored direction.
    pub reverse: bool,
}

/// Output of a traversal before assembly.
///
/// `link_seq` is always one shorter than `node_seq`, and no node id repeats
/// within `node_seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    pub node_seq: Vec<NodeId>,
    pub link_seq: Vec<Hop>,
    pub total_cost: f64,
    /// How the path terminated; `None` for point-to-point routes.
    pub endpoint: Option<EndpointKind>,
}

impl RawPath {
    /// The zero-length path sitting on `start`.
    pub fn single(start: NodeId) -> Self {
        Self {
            node_seq: vec![start],
            link_seq: Vec::new(),
            total_cost: 0.0,
            endpoint: None,
        }
    }

    /// First node of the path; `None` only for an empty `node_seq`.
    pub fn start(&self) -> Option<NodeId> {
        self.node_seq.first().copied()
    }

    /// Last node of the path.
    pub fn terminal(&self) -> Option<NodeId> {
        self.node_seq.last().copied()
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.link_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.link_seq.is_empty()
    }

    /// Whether `node` is already on the path.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node_seq.contains(&node)
    }

    /// A copy of this path extended by one hop.
    pub fn extended(&self, hop: Hop, next: NodeId, cost: f64) -> Self {
        let mut node_seq = Vec::with_capacity(self.node_seq.len() + 1);
        node_seq.extend_from_slice(&self.node_seq);
        node_seq.push(next);

        let mut link_seq = Vec::with_capacity(self.link_seq.len() + 1);
        link_seq.extend_from_slice(&self.link_seq);
        link_seq.push(hop);

        Self {
            node_seq,
            link_seq,
            total_cost: self.total_cost + cost,
            endpoint: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PathLink / PathResult
// ---------------------------------------------------------------------------

/// Position of a hop within its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeFlag {
    #[serde(rename = "S")]
    Start,
    #[serde(rename = "I")]
    Intermediate,
    #[serde(rename = "E")]
    End,
}

impl NodeFlag {
    pub fn as_char(&self) -> char {
        match self {
            Self::Start => 'S',
            Self::Intermediate => 'I',
            Self::End => 'E',
        }
    }
}

impl std::fmt::Display for NodeFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One hop of an assembled path, denormalized for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathLink {
    /// 0-based position within the path.
    pub seq: usize,
    pub link_id: LinkId,
    /// The link's cost.
    pub length: f64,
    pub start_node_id: NodeId,
    pub start_node_data_code: i64,
    pub start_node_utility_no: i64,
    pub end_node_id: NodeId,
    pub end_node_data_code: i64,
    pub end_node_utility_no: i64,
    /// Serialized as `1`/`0`.
    #[serde(with = "int_flag")]
    pub reverse: bool,
    pub node_flag: NodeFlag,
}

/// A complete, persistable path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// 1-based ordinal within one traversal call.
    pub ordinal: u32,
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
    pub total_cost: f64,
    pub endpoint: Option<EndpointKind>,
    pub links: Vec<PathLink>,
}

impl PathResult {
    /// Node ids in traversal order, start first.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.links.len() + 1);
        ids.push(self.start_node_id);
        ids.extend(self.links.iter().map(|l| l.end_node_id));
        ids
    }

    pub fn link_ids(&self) -> Vec<LinkId> {
        self.links.iter().map(|l| l.link_id).collect()
    }
}

mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}
