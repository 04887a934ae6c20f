//! nettrace: path finding over facility utility networks.
//!
//! Given an in-memory snapshot of a utility network (nodes and the physical
//! links joining them), nettrace answers downstream connectivity questions:
//! every path from a start node to the equipment it feeds, the path to the
//! nearest endpoint, or the cheapest route between two given points.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nettrace::graph::{GraphIndex, ShortestPathFinder, TraversalFilter};
//! use nettrace::types::{Link, Node};
//!
//! let graph = GraphIndex::build(
//!     vec![Node::new(1), Node::new(2), Node::new(3).with_data_code(15000)],
//!     vec![Link::directed(10, 1, 2, 1.0), Link::directed(11, 2, 3, 2.0)],
//! )?;
//! let finder = ShortestPathFinder::with_graph(Arc::new(graph));
//! let path = finder.find_shortest_path(1, &TraversalFilter::new().target(15000))?;
//! assert_eq!(path.map(|p| p.end_node_id), Some(3));
//! # Ok::<(), nettrace::error::TraceError>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod observability;
pub mod tracer;
pub mod types;

pub use error::{Result, TraceError};
pub use tracer::{TraceOutcome, TraceRequest, Tracer};
