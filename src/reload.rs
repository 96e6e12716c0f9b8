//! Periodic reloading of the policies file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::ratelimit::{Clock, PolicySet, Throttle};

/// Re-read `path` every `interval` and install the policies when they change.
///
/// A file that fails to load or validate is logged and skipped; the policies
/// already in effect stay active.
pub fn spawn_policy_reload<C: Clock + 'static>(
    throttle: Arc<Throttle<C>>,
    path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    info!(
        path = %path.display(),
        interval_secs = interval.as_secs(),
        "Policy reloading enabled"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            reload_once(&throttle, &path);
        }
    })
}

/// Returns `true` when a new policy set was installed.
pub fn reload_once<C: Clock>(throttle: &Throttle<C>, path: &Path) -> bool {
    match PolicySet::from_file(path) {
        Ok(policies) if policies == throttle.policies() => {
            debug!(path = %path.display(), "Policies unchanged");
            false
        }
        Ok(policies) => {
            throttle.set_policies(policies);
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to reload policies, keeping current set");
            false
        }
    }
}
