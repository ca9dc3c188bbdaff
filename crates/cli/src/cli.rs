//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use glossa_core::ChangeType;
use uuid::Uuid;

/// Operate on versioned Glossa content stored in Postgres.
#[derive(Debug, Parser)]
#[command(name = "glossa", version, about)]
pub struct Cli {
    /// JSON file with grading configuration overrides.
    #[arg(long, global = true, env = "GLOSSA_GRADING_CONFIG")]
    pub grading_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,

    /// Add a version to a content lineage.
    Create {
        content_id: Uuid,
        /// Content payload as a JSON object.
        #[arg(long)]
        data: String,
        #[arg(long)]
        author: String,
        /// Kind of change; decides which version component is bumped.
        #[arg(long, value_enum, ignore_case = true)]
        change_type: Option<ChangeTypeArg>,
    },

    /// Start a new edition from an existing version.
    Branch {
        base_id: Uuid,
        #[arg(long)]
        author: String,
    },

    /// Merge a source version into the lineage of a target version.
    Merge {
        source_id: Uuid,
        target_id: Uuid,
        #[arg(long)]
        author: Option<String>,
    },

    /// Restore an earlier version's content as a new version.
    Revert {
        target_id: Uuid,
        #[arg(long)]
        author: String,
    },

    /// Publish a validated version.
    Publish {
        version_id: Uuid,
        #[arg(long)]
        author: String,
    },

    /// List a lineage, newest first.
    History { content_id: Uuid },

    /// Show field-level differences between two versions.
    Compare { from: Uuid, to: Uuid },

    /// Grade a version, optionally recording the result.
    Grade {
        version_id: Uuid,
        /// Store the result on the version.
        #[arg(long)]
        apply: bool,
    },

    /// Set or clear community approval.
    Approve {
        version_id: Uuid,
        #[arg(long)]
        revoke: bool,
    },

    /// Show the versions a version was derived from.
    Parents { version_id: Uuid },

    /// Permanently delete a version.
    Remove { version_id: Uuid },
}

/// Change classification accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangeTypeArg {
    Creation,
    Modification,
    Deletion,
    Merge,
    Revert,
}

impl From<ChangeTypeArg> for ChangeType {
    fn from(arg: ChangeTypeArg) -> Self {
        match arg {
            ChangeTypeArg::Creation => Self::Creation,
            ChangeTypeArg::Modification => Self::Modification,
            ChangeTypeArg::Deletion => Self::Deletion,
            ChangeTypeArg::Merge => Self::Merge,
            ChangeTypeArg::Revert => Self::Revert,
        }
    }
}
