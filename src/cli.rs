use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Daily { config_path: PathBuf },
    DownloadAll { config_path: PathBuf, dst: PathBuf },
    Help,
}

/// Parse program arguments (without the binary name).
///
/// Supported forms:
///   hapi daily [config.json]
///   hapi download-all [config.json] <dst.json>
///   hapi help
pub fn parse_args(args: &[String]) -> Result<Action> {
    let Some(action) = args.first() else {
        return Ok(Action::Help);
    };

    match action.as_str() {
        "help" | "-h" | "--help" => Ok(Action::Help),
        "daily" => {
            if args.len() > 2 {
                bail!("Usage: hapi daily [config.json]");
            }
            Ok(Action::Daily {
                config_path: optional_path(args.get(1)),
            })
        }
        "download-all" => {
            // The destination is always the last argument; the config path
            // before it may be omitted.
            let (config, dst) = match args.len() {
                2 => (None, &args[1]),
                3 => (Some(&args[1]), &args[2]),
                _ => bail!("Usage: hapi download-all [config.json] <dst.json>"),
            };
            Ok(Action::DownloadAll {
                config_path: optional_path(config),
                dst: PathBuf::from(dst),
            })
        }
        other => bail!("Unknown action '{other}'. Run 'hapi help' for usage."),
    }
}

fn optional_path(arg: Option<&String>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(config::default_config_path)
}

pub fn print_help() {
    println!("hapi — sprint status reports over flat text\n");
    println!("USAGE:");
    println!("  hapi daily [config.json]");
    println!("      Run one step of the daily routine. The first run fetches the");
    println!("      sprint snapshot and writes base.hapi and input.hapi; after you");
    println!("      edit input.hapi, the second run submits the changes.");
    println!();
    println!("  hapi download-all [config.json] <dst.json>");
    println!("      Fetch every work item in the configured area and write the");
    println!("      normalized snapshot to <dst.json>.");
    println!();
    println!("  The config path defaults to ~/.hapi/config.json.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_means_help() {
        assert_eq!(parse_args(&args(&[])).unwrap(), Action::Help);
        assert_eq!(parse_args(&args(&["help"])).unwrap(), Action::Help);
        assert_eq!(parse_args(&args(&["--help"])).unwrap(), Action::Help);
    }

    #[test]
    fn daily_with_explicit_config() {
        let action = parse_args(&args(&["daily", "/tmp/cfg.json"])).unwrap();
        assert_eq!(
            action,
            Action::Daily {
                config_path: PathBuf::from("/tmp/cfg.json")
            }
        );
    }

    #[test]
    fn daily_defaults_the_config_path() {
        let action = parse_args(&args(&["daily"])).unwrap();
        let Action::Daily { config_path } = action else {
            panic!("expected a daily action");
        };
        assert!(config_path.ends_with(".hapi/config.json"));
    }

    #[test]
    fn daily_rejects_extra_args() {
        assert!(parse_args(&args(&["daily", "a", "b"])).is_err());
    }

    #[test]
    fn download_all_with_config_and_dst() {
        let action = parse_args(&args(&["download-all", "/tmp/cfg.json", "/tmp/wits.json"])).unwrap();
        assert_eq!(
            action,
            Action::DownloadAll {
                config_path: PathBuf::from("/tmp/cfg.json"),
                dst: PathBuf::from("/tmp/wits.json"),
            }
        );
    }

    #[test]
    fn download_all_dst_only_defaults_the_config() {
        let action = parse_args(&args(&["download-all", "/tmp/wits.json"])).unwrap();
        let Action::DownloadAll { config_path, dst } = action else {
            panic!("expected a download-all action");
        };
        assert!(config_path.ends_with(".hapi/config.json"));
        assert_eq!(dst, PathBuf::from("/tmp/wits.json"));
    }

    #[test]
    fn download_all_without_dst_fails() {
        let err = parse_args(&args(&["download-all"])).unwrap_err();
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn unknown_action_fails() {
        let err = parse_args(&args(&["weekly"])).unwrap_err();
        assert!(err.to_string().contains("Unknown action 'weekly'"));
    }
}
