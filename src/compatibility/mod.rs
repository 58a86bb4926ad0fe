/// Compatibility domain layer
///
/// Pure analysis logic: models, the knowledge base, matching, verdict
/// policies and the interpretation of package-manager probe output. Nothing
/// here touches the filesystem or spawns processes except the manifest
/// writer and the native artifact scan, which work inside a caller-supplied
/// directory.
pub mod domain;
pub mod policies;
pub mod services;
