/// Data organization for the map generator.
///
/// Submodules:
/// - `grouping`: partitions observations into the fixed encryption buckets.
/// - `center`: computes the initial map center from the buckets.

pub mod center;
pub mod grouping;
