//! Graph layer: in-memory network index, traversals, and result assembly.

pub mod assemble;
pub mod cache;
pub mod classify;
pub(crate) mod dijkstra;
pub mod endpoint;
pub mod enumerate;
pub mod filter;
pub mod index;
pub mod route;
pub mod shortest;

pub use assemble::PathAssembler;
pub use enumerate::PathEnumerator;
pub use filter::{TraversalFilter, TraversalLimits};
pub use index::GraphIndex;
pub use route::RouteFinder;
pub use shortest::ShortestPathFinder;
