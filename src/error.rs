/// Errors are `anyhow` errors throughout. Failures a caller needs to branch on (a raw row that
/// could not be used, an unparseable amount) have their own types and are reported as values.
pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
