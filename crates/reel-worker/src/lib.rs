//! Reelsmith render worker: template registry, submission service and the
//! bounded worker pool that runs template jobs.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod progress;
pub mod registry;
pub mod service;
pub mod store;

pub use cache::TtlCache;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use progress::{MemoryProgressStore, ProgressBridge, ProgressStore};
pub use registry::{ListFilter, TemplateRegistry};
pub use service::{QueuedJob, VideoService};
pub use store::{JobStore, MemoryJobStore, MemoryParamStore, ParamStore};
