use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dawa_engine::dawa_types::{Locale, Role};

/// dawa - verify medicine packaging against regulated products
#[derive(Parser, Debug)]
#[command(
    name = "dawa",
    version,
    about = "Verify medicine packaging and track suspected counterfeits",
    long_about = "Photograph a medicine box, let the analysis service judge it, and keep a \
                  local history of results.\n\n\
                  Citizens see their own cabinet; inspectors see per-city reports and a \
                  generated action plan."
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a photo of medicine packaging
    Scan {
        /// Image file (JPEG, PNG, WebP, HEIC)
        image: PathBuf,

        /// City the photo was taken in (defaults to [scan].default_locale)
        #[arg(short, long)]
        locale: Option<Locale>,
    },

    /// List past verifications, newest first
    History {
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the dashboard for a role
    Dashboard {
        #[arg(short, long, default_value_t = Role::Citizen)]
        role: Role,

        /// Ask the analysis service for an action plan (inspector only)
        #[arg(long)]
        narrative: bool,
    },

    /// Classify a photo of household waste
    Waste {
        image: PathBuf,
    },

    /// Set the default city used by `scan`
    Locale {
        city: Locale,
    },
}
