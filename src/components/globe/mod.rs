//! Agents on a rotating globe, linked by aggregated trade arcs.

mod component;
mod projection;
pub mod transform;
pub mod types;

pub use component::{GeoDirectoryFeed, GlobeCanvas, use_geo_directory};
pub use transform::build_globe;
pub use types::{AgentLocation, GeoCoord, GeoDirectory, GlobeArc, GlobeData, GlobePoint};
