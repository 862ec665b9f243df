//! Station network graph and routing.

mod cache;
mod graph;
mod router;

pub use cache::{GraphCache, GraphCacheConfig};
pub use graph::{Edge, NetworkGraph};
pub use router::{RouteResult, find_route};
