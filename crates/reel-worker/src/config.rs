//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent render jobs
    pub max_workers: usize,
    /// Root for job-scoped working directories
    pub work_dir: String,
    /// Directory for finished videos and covers
    pub output_dir: String,
    /// Speech synthesis endpoint URL
    pub speech_endpoint: String,
    /// Root of the local media asset store
    pub asset_root: String,
    /// Per-job encode timeout
    pub render_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            work_dir: "/tmp/reelsmith".to_string(),
            output_dir: "/var/lib/reelsmith/output".to_string(),
            speech_endpoint: "http://localhost:5002/api/tts".to_string(),
            asset_root: "/var/lib/reelsmith/assets".to_string(),
            render_timeout: Duration::from_secs(1800),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_workers: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_workers),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            output_dir: std::env::var("WORKER_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            speech_endpoint: std::env::var("SPEECH_ENDPOINT").unwrap_or(defaults.speech_endpoint),
            asset_root: std::env::var("ASSET_ROOT").unwrap_or(defaults.asset_root),
            render_timeout: Duration::from_secs(
                std::env::var("WORKER_RENDER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
