//! Feature toggles with hot-reload.
//!
//! Every orchestration call reads a fresh snapshot through
//! [`FeatureToggleProvider::current`]. Reloading swaps the snapshot
//! atomically; calls already holding the old `Arc` keep seeing old values.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// The two switches that steer vehicle enrichment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Whether insurances are enriched with vehicle details at all
    pub enable_vehicle_enrichment: bool,
    /// Batch lookups when on, concurrent single-key lookups when off
    pub enable_batch_vehicle_call: bool,
}

/// Source of the current feature toggle snapshot.
pub trait FeatureToggleProvider: Send + Sync {
    /// The latest loaded toggles.
    fn current(&self) -> Arc<FeatureToggles>;
}

/// Fixed toggles that never change.
#[derive(Debug, Clone, Default)]
pub struct StaticToggles(Arc<FeatureToggles>);

impl StaticToggles {
    /// Wrap a fixed snapshot.
    #[must_use]
    pub fn new(toggles: FeatureToggles) -> Self {
        Self(Arc::new(toggles))
    }
}

impl FeatureToggleProvider for StaticToggles {
    fn current(&self) -> Arc<FeatureToggles> {
        Arc::clone(&self.0)
    }
}

/// Toggles backed by an atomically swapped snapshot.
#[derive(Debug, Default)]
pub struct ReloadableToggles {
    snapshot: RwLock<Arc<FeatureToggles>>,
}

/// Only the toggle table of the config file is read on reload.
#[derive(Deserialize)]
struct ToggleSection {
    #[serde(default)]
    feature_toggles: FeatureToggles,
}

impl ReloadableToggles {
    /// Create a provider seeded with an initial snapshot.
    #[must_use]
    pub fn new(initial: FeatureToggles) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(initial)),
        }
    }

    /// Swap in a new snapshot.
    pub fn replace(&self, toggles: FeatureToggles) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if **guard != toggles {
            tracing::info!(
                enable_vehicle_enrichment = toggles.enable_vehicle_enrichment,
                enable_batch_vehicle_call = toggles.enable_batch_vehicle_call,
                "Feature toggles updated"
            );
        }
        *guard = Arc::new(toggles);
    }

    /// Parse the `[feature_toggles]` table from TOML and swap it in.
    ///
    /// On a parse error the previous snapshot stays in place.
    pub fn reload_from_str(&self, contents: &str) -> ConfigResult<FeatureToggles> {
        let section: ToggleSection = toml::from_str(contents)?;
        self.replace(section.feature_toggles);
        Ok(section.feature_toggles)
    }

    /// Re-read the config file and swap in its toggles.
    pub fn reload_from_file(&self, path: &Path) -> ConfigResult<FeatureToggles> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        self.reload_from_str(&contents)
    }

    /// Poll `path` every `interval` and reload when its contents change.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle stops the watcher.
    #[must_use]
    pub fn watch(self: &Arc<Self>, path: impl Into<PathBuf>, interval: Duration) -> ToggleWatcher {
        let toggles = Arc::clone(self);
        let path = path.into();

        let handle = tokio::spawn(async move {
            let mut last_seen: Option<String> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let contents = match tokio::fs::read_to_string(&path).await {
                    Ok(contents) => contents,
                    Err(e) => {
                        tracing::warn!("Failed to read toggles from {}: {}", path.display(), e);
                        continue;
                    }
                };

                if last_seen.as_deref() == Some(contents.as_str()) {
                    continue;
                }

                match toggles.reload_from_str(&contents) {
                    Ok(_) => tracing::debug!("Reloaded feature toggles from {}", path.display()),
                    Err(e) => tracing::warn!(
                        "Keeping previous feature toggles, {} is invalid: {}",
                        path.display(),
                        e
                    ),
                }
                last_seen = Some(contents);
            }
        });

        ToggleWatcher { handle }
    }
}

impl FeatureToggleProvider for ReloadableToggles {
    fn current(&self) -> Arc<FeatureToggles> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }
}

/// Handle for a running toggle watcher; aborts the task on drop.
#[derive(Debug)]
pub struct ToggleWatcher {
    handle: JoinHandle<()>,
}

impl Drop for ToggleWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ENABLED: FeatureToggles = FeatureToggles {
        enable_vehicle_enrichment: true,
        enable_batch_vehicle_call: true,
    };

    #[test]
    fn test_static_toggles() {
        let toggles = StaticToggles::new(ENABLED);
        assert_eq!(*toggles.current(), ENABLED);
    }

    #[test]
    fn test_replace_swaps_snapshot() {
        let toggles = ReloadableToggles::new(FeatureToggles::default());
        let before = toggles.current();

        toggles.replace(ENABLED);

        // Holders of the old snapshot are unaffected
        assert!(!before.enable_vehicle_enrichment);
        assert_eq!(*toggles.current(), ENABLED);
    }

    #[test]
    fn test_reload_ignores_other_sections() {
        let toggles = ReloadableToggles::default();
        let loaded = toggles
            .reload_from_str(
                r#"
[vehicle_client]
base_url = "http://vehicle"

[feature_toggles]
enable_vehicle_enrichment = true
"#,
            )
            .expect("reload toggles");

        assert!(loaded.enable_vehicle_enrichment);
        assert!(!loaded.enable_batch_vehicle_call);
        assert_eq!(*toggles.current(), loaded);
    }

    #[test]
    fn test_invalid_reload_keeps_previous() {
        let toggles = ReloadableToggles::new(ENABLED);
        let result = toggles.reload_from_str("[feature_toggles]\nenable_vehicle_enrichment = 3");

        assert!(result.is_err());
        assert_eq!(*toggles.current(), ENABLED);
    }

    #[test]
    fn test_reload_from_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let toggles = ReloadableToggles::default();
        let result = toggles.reload_from_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_reload_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[feature_toggles]\nenable_vehicle_enrichment = true\nenable_batch_vehicle_call = true\n",
        )
        .expect("write config");

        let toggles = ReloadableToggles::default();
        assert_eq!(toggles.reload_from_file(&path).expect("reload"), ENABLED);
        assert_eq!(*toggles.current(), ENABLED);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_watch_picks_up_changes() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[feature_toggles]\nenable_vehicle_enrichment = false\n")
            .expect("write config");

        let toggles = Arc::new(ReloadableToggles::default());
        let _watcher = toggles.watch(&path, Duration::from_millis(10));

        std::fs::write(
            &path,
            "[feature_toggles]\nenable_vehicle_enrichment = true\nenable_batch_vehicle_call = true\n",
        )
        .expect("rewrite config");

        let mut reloaded = false;
        for _ in 0..200 {
            if *toggles.current() == ENABLED {
                reloaded = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reloaded, "watcher should pick up the new toggles");
    }
}
