/// Wardriving survey map generator.
///
/// Turns a delimited export of wireless-network observations into a static
/// HTML page with one marker per network, colored and toggleable by
/// encryption type.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod render;
