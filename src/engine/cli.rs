//! Command-line interface for ar-placement.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::config::AppConfig;
use crate::engine::demos::DemoKind;

#[derive(Debug, Parser)]
#[command(name = "ar-placement")]
#[command(about = "Tap-to-place AR demo with a simulated session", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum CliCommand {
    /// Open a window and run a demo (press S to enter the simulated AR session)
    Run {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run a demo headless against a scripted simulated session
    Simulate {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of frames to run
        #[arg(long)]
        frames: Option<u64>,

        /// Select on every K-th frame (0 disables)
        #[arg(long)]
        select_every: Option<u64>,

        /// End the session at frame M and start a new one
        #[arg(long)]
        end_session_at: Option<u64>,

        /// Write the final scene graph as JSON
        #[arg(long)]
        dump_scene: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct CommonArgs {
    /// Demo to run
    #[arg(long, value_enum)]
    pub demo: Option<DemoKind>,

    /// Model placed on select (http(s):// or file:// URL)
    #[arg(long)]
    pub model_url: Option<String>,
}

impl Cli {
    /// No subcommand means `run` with the configured demo.
    pub fn effective_command(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Run {
            common: CommonArgs {
                demo: None,
                model_url: None,
            },
        })
    }
}

impl CliCommand {
    /// Fold the flags into `config`; flags win over the file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        let common = match self {
            CliCommand::Run { common } => common,
            CliCommand::Simulate {
                common,
                frames,
                select_every,
                end_session_at,
                ..
            } => {
                let sim = &mut config.simulation;
                if let Some(frames) = *frames {
                    sim.frames = frames;
                }
                if let Some(k) = *select_every {
                    sim.select_every = k;
                }
                if end_session_at.is_some() {
                    sim.end_session_at = *end_session_at;
                }
                common
            }
        };

        if let Some(demo) = common.demo {
            config.demo = demo;
        }
        if let Some(url) = &common.model_url {
            config.placement.model_url = url.clone();
        }
    }
}
