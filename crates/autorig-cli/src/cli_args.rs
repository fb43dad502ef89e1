//! CLI argument definitions for the AutoRig command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{ArgAction, Parser, Subcommand};

/// AutoRig - Biped rig assembly from named mesh parts
#[derive(Parser)]
#[command(name = "autorig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Check mesh part names against the body region vocabulary
    Validate {
        /// Path to the scene or parts file
        #[arg(short, long)]
        scene: String,

        /// Rig config file (default: $AUTORIG_CONFIG, then built-in defaults)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Build the full rig: joints, controls, offset groups and skin
    Rig {
        /// Path to the scene or parts file
        #[arg(short, long)]
        scene: String,

        /// Mesh names to rig (default: the scene's stored selection)
        #[arg(long = "select", value_name = "NAME")]
        select: Vec<String>,

        /// Rig config file (default: $AUTORIG_CONFIG, then built-in defaults)
        #[arg(short, long)]
        config: Option<String>,

        /// Output scene path (default: <scene>.rig.json)
        #[arg(short, long)]
        out: Option<String>,

        /// Exclude unrecognized parts without asking
        #[arg(short, long, conflicts_with = "no_input")]
        yes: bool,

        /// Cancel instead of asking when parts are unrecognized
        #[arg(long)]
        no_input: bool,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Bind region meshes to their joints on an already rigged scene
    Bind {
        /// Path to the rigged scene file
        #[arg(short, long)]
        scene: String,

        /// Rig config file (default: $AUTORIG_CONFIG, then built-in defaults)
        #[arg(short, long)]
        config: Option<String>,

        /// Output scene path (default: overwrite the input)
        #[arg(short, long)]
        out: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Insert zero-pose locators above controls of a rigged scene
    Locate {
        /// Path to the rigged scene file
        #[arg(short, long)]
        scene: String,

        /// Control names (default: every per-joint control)
        #[arg(long = "select", value_name = "NAME")]
        select: Vec<String>,

        /// Rig config file (default: $AUTORIG_CONFIG, then built-in defaults)
        #[arg(short, long)]
        config: Option<String>,

        /// Output scene path (default: overwrite the input)
        #[arg(short, long)]
        out: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the biped topology table
    Topology {
        /// Topology preset
        #[arg(long, value_parser = ["biped_basic_v1", "biped_extended_v1", "basic", "extended"])]
        preset: Option<String>,

        /// Print a single view
        #[arg(long, value_parser = ["joint", "control", "offset", "skin"])]
        kind: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the node hierarchy and rig hash of a scene file
    Inspect {
        /// Path to the scene or parts file
        #[arg(short, long)]
        scene: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}
