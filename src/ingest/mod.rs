/// Input readers for survey data.
///
/// Submodules:
/// - `csv_loader`: reads a delimited survey export into validated observations.

pub mod csv_loader;
