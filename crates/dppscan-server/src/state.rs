//! Shared application state.

use dppscan_core::{Result, ScannerConfig};
use dppscan_resolve::{Resolver, ResolverOptions};
use dppscan_store::ScanStore;

/// Shared state accessible from all route handlers.
pub struct AppState {
    pub config: ScannerConfig,
    pub store: ScanStore,
    pub resolver: Resolver,
}

impl AppState {
    pub fn new(config: ScannerConfig, store: ScanStore) -> Result<Self> {
        let resolver = Resolver::new(ResolverOptions {
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })?;
        Ok(Self {
            config,
            store,
            resolver,
        })
    }
}
