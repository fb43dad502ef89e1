//! AutoRig CLI - Command-line interface for biped rig assembly
//!
//! This binary validates mesh part names, builds rigs from scene files and
//! inspects the results.

use autorig_assembly::Decision;
use clap::Parser;
use std::process::ExitCode;

use autorig_cli::commands;

mod cli_args;
use cli_args::{Cli, Commands};

/// Maps `-v` occurrences to a default log filter. `RUST_LOG` still wins.
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Maps `--yes` / `--no-input` to a fixed prompt answer.
fn fixed_answer(yes: bool, no_input: bool) -> Option<Decision> {
    if yes {
        Some(Decision::Proceed)
    } else if no_input {
        Some(Decision::Cancel)
    } else {
        None
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .format_timestamp(None)
    .init();

    let result = match cli.command {
        Commands::Validate {
            scene,
            config,
            json,
        } => commands::validate::run(&scene, config.as_deref(), json),
        Commands::Rig {
            scene,
            select,
            config,
            out,
            yes,
            no_input,
            json,
        } => commands::rig::run(
            &scene,
            &select,
            config.as_deref(),
            out.as_deref(),
            fixed_answer(yes, no_input),
            json,
        ),
        Commands::Bind {
            scene,
            config,
            out,
            json,
        } => commands::bind::run(&scene, config.as_deref(), out.as_deref(), json),
        Commands::Locate {
            scene,
            select,
            config,
            out,
            json,
        } => commands::locate::run(&scene, &select, config.as_deref(), out.as_deref(), json),
        Commands::Topology { preset, kind, json } => {
            commands::topology::run(preset.as_deref(), kind.as_deref(), json)
        }
        Commands::Inspect { scene, json } => commands::inspect::run(&scene, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["autorig", "validate", "--scene", "hero.json"]).unwrap();
        match cli.command {
            Commands::Validate {
                scene,
                config,
                json,
            } => {
                assert_eq!(scene, "hero.json");
                assert!(config.is_none());
                assert!(!json);
            }
            _ => panic!("expected validate command"),
        }
    }

    #[test]
    fn test_cli_parses_rig_with_selection() {
        let cli = Cli::try_parse_from([
            "autorig",
            "rig",
            "--scene",
            "hero.json",
            "--select",
            "Char_Pelvis",
            "--select",
            "Char_Head",
            "--yes",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Rig {
                scene,
                select,
                yes,
                no_input,
                json,
                ..
            } => {
                assert_eq!(scene, "hero.json");
                assert_eq!(select, vec!["Char_Pelvis", "Char_Head"]);
                assert!(yes);
                assert!(!no_input);
                assert!(json);
            }
            _ => panic!("expected rig command"),
        }
    }

    #[test]
    fn test_cli_rejects_yes_with_no_input() {
        let result = Cli::try_parse_from([
            "autorig",
            "rig",
            "--scene",
            "hero.json",
            "--yes",
            "--no-input",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_locate() {
        let cli = Cli::try_parse_from([
            "autorig",
            "locate",
            "--scene",
            "hero.rig.json",
            "--select",
            "Char_Head_ctrl",
        ])
        .unwrap();
        match cli.command {
            Commands::Locate {
                scene, select, out, ..
            } => {
                assert_eq!(scene, "hero.rig.json");
                assert_eq!(select, vec!["Char_Head_ctrl"]);
                assert!(out.is_none());
            }
            _ => panic!("expected locate command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        let result = Cli::try_parse_from(["autorig", "topology", "--kind", "mesh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::try_parse_from(["autorig", "-vv", "inspect", "--scene", "a.json"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "debug");
        let cli = Cli::try_parse_from(["autorig", "inspect", "--scene", "a.json", "-v"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "info");
    }

    #[test]
    fn test_fixed_answer() {
        assert_eq!(fixed_answer(true, false), Some(Decision::Proceed));
        assert_eq!(fixed_answer(false, true), Some(Decision::Cancel));
        assert_eq!(fixed_answer(false, false), None);
    }
}
