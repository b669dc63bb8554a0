mod loader;

pub use loader::{Config, FilterConfig, ResolverConfig};
