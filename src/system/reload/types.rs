//! Reload type definitions
//!
//! - `ReloadPhase`: where the coordinator's state machine is
//! - `ReloadResult`: outcome of one locale reload
//! - `ReloadEvent`: events emitted during reloads
//! - `ReloadStatus`: snapshot of the coordinator
//! - `LoaderSettings`: page-level settings the coordinator is built with

use chrono::{DateTime, Utc};

use crate::loader::{CleanupRules, DEFAULT_SDK_HOST};

/// Coordinator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReloadPhase {
    #[default]
    Uninitialized,
    /// Initial load in flight
    Loading,
    Ready,
    /// Between teardown start and settlement of the new load
    Reloading,
}

impl std::fmt::Display for ReloadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadPhase::Uninitialized => write!(f, "uninitialized"),
            ReloadPhase::Loading => write!(f, "loading"),
            ReloadPhase::Ready => write!(f, "ready"),
            ReloadPhase::Reloading => write!(f, "reloading"),
        }
    }
}

/// Result of a reload operation
#[derive(Debug, Clone)]
pub struct ReloadResult {
    /// Locale the SDK was reloaded with
    pub locale: String,
    /// Generation of the load handle the reload produced
    pub generation: u64,
    pub success: bool,
    /// Error message if failed
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ReloadResult {
    pub fn success(locale: &str, generation: u64, started_at: DateTime<Utc>) -> Self {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            locale: locale.to_string(),
            generation,
            success: true,
            message: None,
            started_at,
            finished_at,
            duration_ms,
        }
    }

    pub fn failure(
        locale: &str,
        generation: u64,
        started_at: DateTime<Utc>,
        error: String,
    ) -> Self {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            locale: locale.to_string(),
            generation,
            success: false,
            message: Some(error),
            started_at,
            finished_at,
            duration_ms,
        }
    }
}

/// Events emitted during reload operations
#[derive(Debug, Clone)]
pub enum ReloadEvent {
    /// Availability went down and teardown is about to start
    Started { locale: String, generation: u64 },
    /// New load settled successfully, availability is back up
    Completed { result: ReloadResult },
    /// New load failed; availability is back up all the same
    Failed {
        locale: String,
        generation: u64,
        error: String,
    },
}

/// Current status of the coordinator
#[derive(Debug, Clone, Default)]
pub struct ReloadStatus {
    pub phase: ReloadPhase,
    /// Locale of the current load handle
    pub locale: String,
    /// Generation of the current load handle
    pub generation: u64,
    /// Completed reloads, failed ones included
    pub reload_count: u64,
    pub last_reload: Option<ReloadResult>,
}

/// Where the SDK is fetched from and what teardown removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    pub sdk_host: String,
    pub cleanup: CleanupRules,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            sdk_host: DEFAULT_SDK_HOST.to_string(),
            cleanup: CleanupRules::default(),
        }
    }
}
