//! Build information reported in log records and by the health check.

/// The package version of the server.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The source revision, if provided at build time.
pub const REVISION: Option<&str> = option_env!("BACKEND_REVISION");

/// When the binary was built, if provided at build time.
pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");
