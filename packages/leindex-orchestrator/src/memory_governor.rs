//! RSS-driven cache governor: polls process RSS and reacts at three
//! increasing thresholds — Warning just logs, Prompt spills PDG/vector
//! caches for idle projects, Emergency evicts whole projects.
//!
//! Grounded on the teacher's polling-loop shape (a `tokio::time::interval`
//! driving a `tokio::select!` against a shutdown signal), generalized from
//! "checkpoint on a schedule" to "act on a threshold crossing".

use std::collections::HashSet;
use std::sync::Arc;

use sysinfo::{Pid, System};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::MemoryConfig;
use crate::project::ProjectRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Normal,
    Warning,
    Prompt,
    Emergency,
}

fn classify(rss_bytes: u64, config: &MemoryConfig) -> Level {
    let budget = config.budget_bytes as f64;
    let used = rss_bytes as f64 / budget;
    if used >= config.emergency_fraction as f64 {
        Level::Emergency
    } else if used >= config.prompt_fraction as f64 {
        Level::Prompt
    } else if used >= config.warning_fraction as f64 {
        Level::Warning
    } else {
        Level::Normal
    }
}

/// Current process RSS in bytes, via `sysinfo`.
pub fn current_rss_bytes() -> u64 {
    let mut system = System::new_all();
    system.refresh_all();
    let pid = Pid::from_u32(std::process::id());
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
}

/// Runs until `shutdown` fires, polling RSS every `config.poll_interval_secs`
/// and reacting to the highest threshold crossed. `active_projects` lets the
/// caller mark projects mid-request so the Emergency path never evicts one
/// out from under an in-flight query.
pub async fn run(
    registry: Arc<ProjectRegistry>,
    config: MemoryConfig,
    active_projects: Arc<dyn Fn() -> HashSet<String> + Send + Sync>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
        config.poll_interval_secs.max(1),
    ));
    let mut last_level = Level::Normal;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("memory governor shutting down");
                    return;
                }
                continue;
            }
        }

        let rss = current_rss_bytes();
        let level = classify(rss, &config);
        if level == last_level && level != Level::Emergency {
            continue;
        }
        last_level = level;

        match level {
            Level::Normal => {}
            Level::Warning => {
                warn!(rss, budget = config.budget_bytes, "memory usage above warning threshold");
            }
            Level::Prompt => {
                warn!(rss, budget = config.budget_bytes, "memory usage above prompt threshold, spilling idle caches");
                registry.spill_lru_except(1);
            }
            Level::Emergency => {
                warn!(rss, budget = config.budget_bytes, "memory usage above emergency threshold, evicting projects");
                let active = active_projects();
                let evicted = registry.evict_all_except(&active);
                info!(evicted, "emergency eviction complete");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MemoryConfig {
        MemoryConfig {
            budget_bytes: 1000,
            warning_fraction: 0.80,
            prompt_fraction: 0.93,
            emergency_fraction: 0.98,
            poll_interval_secs: 30,
        }
    }

    #[test]
    fn classifies_below_warning_as_normal() {
        assert_eq!(classify(100, &config()), Level::Normal);
    }

    #[test]
    fn classifies_each_threshold_boundary() {
        let c = config();
        assert_eq!(classify(800, &c), Level::Warning);
        assert_eq!(classify(930, &c), Level::Prompt);
        assert_eq!(classify(980, &c), Level::Emergency);
    }
}
