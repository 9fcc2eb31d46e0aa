//! Cache generation lifecycle: install warms the current store, activate
//! prunes every other generation. Both run to completion before the
//! listener starts accepting connections.

use tracing::info;

use crate::config::CacheSection;
use crate::core::{CacheStorage, CacheStore, QuiverError, Result};
use crate::upstream::UpstreamClient;

/// Open the configured version store and pre-populate it with every core
/// asset.
///
/// A transport error or a non-2xx status on any asset aborts the install:
/// the store must not come up half-warm with error pages in place of the
/// shell. A later successful install overwrites whatever was written.
pub async fn install(
    storage: &CacheStorage,
    upstream: &UpstreamClient,
    cache: &CacheSection,
) -> Result<CacheStore> {
    info!(
        "Installing cache store '{}' ({} core assets)",
        cache.version,
        cache.core_assets.len()
    );

    let store = storage.open(&cache.version)?;

    for asset in &cache.core_assets {
        let response = upstream.fetch(asset).await?;
        if !response.is_success() {
            return Err(QuiverError::Upstream(format!(
                "core asset {} returned status {}",
                asset, response.status
            )));
        }
        store.put(asset, &response).await?;
        info!("Cached core asset {} ({} bytes)", asset, response.body.len());
    }

    Ok(store)
}

/// Delete every version store other than the configured one
pub fn activate(storage: &CacheStorage, cache: &CacheSection) -> Result<()> {
    for name in storage.names()? {
        if name != cache.version && storage.delete(&name)? {
            info!("Pruned stale cache store '{}'", name);
        }
    }
    Ok(())
}
