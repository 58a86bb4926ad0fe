/// Crate-wide Result alias.
///
/// Fallible operations return `anyhow::Error` so that `ValidatorError`
/// variants and I/O failures can carry context up to the CLI.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
