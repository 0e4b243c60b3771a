//! Generation rate limits.
//!
//! The canvas never decides on its own whether a generation may run; it
//! asks a [`GenerationPolicy`]. [`DailyGenerationLimit`] is the standard
//! policy: a fixed number of successful generations per UTC day, optionally
//! persisted to a small JSON file so the count survives restarts.

use std::path::{Path, PathBuf};

use drawguide_core::library::now_millis;
use serde::{Deserialize, Serialize};

/// Successful generations allowed per day.
pub const DAILY_GENERATION_LIMIT: u32 = 2;

/// File name of the persisted limit state inside the data directory.
pub const LIMIT_FILE: &str = "generation_limit.json";

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Decides whether another generation may run.
pub trait GenerationPolicy: Send {
    /// Whether a generation may start now.
    fn check_allowed(&self) -> bool;

    /// Record a successful generation.
    fn record_attempt(&mut self);
}

/// Current UTC day as days since the Unix epoch.
#[must_use]
pub fn current_day() -> u64 {
    now_millis() / MILLIS_PER_DAY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LimitState {
    day: u64,
    count: u32,
}

/// A per-day generation allowance.
#[derive(Debug, Clone)]
pub struct DailyGenerationLimit {
    limit: u32,
    state: LimitState,
    session_attempts: u32,
    store_path: Option<PathBuf>,
}

impl DailyGenerationLimit {
    /// In-memory limit allowing `limit` generations per day.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            state: LimitState {
                day: current_day(),
                count: 0,
            },
            session_attempts: 0,
            store_path: None,
        }
    }

    /// Limit persisted at `data_dir/generation_limit.json`.
    ///
    /// A missing or unreadable file starts a fresh count.
    #[must_use]
    pub fn open(data_dir: &Path, limit: u32) -> Self {
        let path = data_dir.join(LIMIT_FILE);
        let state = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt limit file {}: {e}", path.display());
                LimitState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LimitState::default(),
            Err(e) => {
                tracing::warn!("Failed to read limit file {}: {e}", path.display());
                LimitState::default()
            }
        };
        Self {
            limit,
            state,
            session_attempts: 0,
            store_path: Some(path),
        }
    }

    fn roll_over(&mut self, today: u64) {
        if self.state.day != today {
            self.state = LimitState {
                day: today,
                count: 0,
            };
        }
    }

    /// Whether a generation is allowed on `today`.
    #[must_use]
    pub fn check_allowed_on(&self, today: u64) -> bool {
        self.state.day != today || self.state.count < self.limit
    }

    /// Record a successful generation on `today`.
    pub fn record_attempt_on(&mut self, today: u64) {
        self.roll_over(today);
        self.state.count = self.state.count.saturating_add(1);
        self.session_attempts = self.session_attempts.saturating_add(1);
        tracing::debug!(
            "Generation {}/{} used today",
            self.state.count,
            self.limit
        );
        self.persist();
    }

    /// Generations left on `today`.
    #[must_use]
    pub fn remaining_on(&self, today: u64) -> u32 {
        if self.state.day == today {
            self.limit.saturating_sub(self.state.count)
        } else {
            self.limit
        }
    }

    /// Generations left today.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining_on(current_day())
    }

    /// Successful generations recorded since this limit was created.
    #[must_use]
    pub fn session_attempts(&self) -> u32 {
        self.session_attempts
    }

    fn persist(&self) {
        let Some(path) = &self.store_path else {
            return;
        };
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize limit state: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            tracing::warn!("Failed to persist limit state to {}: {e}", path.display());
        }
    }
}

impl Default for DailyGenerationLimit {
    fn default() -> Self {
        Self::new(DAILY_GENERATION_LIMIT)
    }
}

impl GenerationPolicy for DailyGenerationLimit {
    fn check_allowed(&self) -> bool {
        self.check_allowed_on(current_day())
    }

    fn record_attempt(&mut self) {
        self.record_attempt_on(current_day());
    }
}

/// Policy that never refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl GenerationPolicy for Unlimited {
    fn check_allowed(&self) -> bool {
        true
    }

    fn record_attempt(&mut self) {}
}
