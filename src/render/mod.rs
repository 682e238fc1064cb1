/// Output rendering.
///
/// Submodules:
/// - `page`: the static HTML map page and its atomic write.

pub mod page;
