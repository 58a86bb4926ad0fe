/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the ports,
/// providing the actual integration with the file system, package
/// managers, container tools and the console.
pub mod outbound;
