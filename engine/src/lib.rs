//! Orchestration for DawaVerify.
//!
//! - [`session`]: the per-attempt scan state machine
//! - [`dashboard`]: pure projections over history snapshots
//! - [`capture`]: loading photos from disk
//! - [`config`]: `~/.dawa/config.toml`
//! - [`init`]: data directory and history start-up

pub mod capture;
pub mod config;
pub mod dashboard;
pub mod init;
pub mod session;

pub use capture::{CaptureError, load_image};
pub use config::{ConfigError, DawaConfig, expand_env_vars};
pub use dashboard::{
    FlagSplit, InspectorNarrative, LocaleReport, NO_NARRATIVE, NarrativeRefresh, count_all,
    count_flagged, distinct_locales, flag_counts, group_by_locale, locale_reports, split_by_flag,
};
pub use init::{DataDir, DataDirSource, data_dir, history_backend, open_history};
pub use session::{ScanFailure, ScanOutcome, ScanPhase, ScanSession, ScanSettings, SessionError};

pub use dawa_history;
pub use dawa_providers;
pub use dawa_types;
