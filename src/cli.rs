//! 非交互子命令

use crate::config::Config;
use crate::package_manager::{CommandKind, PackageManager, PackageRecord};
use crate::search::search_once;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "lazyinstaller",
    about = "Search, install and remove packages across every package manager on this machine",
    version
)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.config/lazyinstaller/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List detected package managers
    Managers,

    /// List every package manager lazyinstaller knows about
    Supported,

    /// Print installed packages from all detected managers
    List,

    /// Search all detected managers
    Search {
        term: String,
    },

    /// Install a package
    Install {
        package: String,
        #[arg(short, long)]
        manager: Option<String>,
    },

    /// Remove a package
    Remove {
        package: String,
        #[arg(short, long)]
        manager: Option<String>,
    },

    /// Upgrade one package, or everything when no package is given
    Upgrade {
        package: Option<String>,
        #[arg(short, long)]
        manager: Option<String>,
    },
}

impl Command {
    /// `supported` 不依赖探测结果
    pub fn needs_manager(&self) -> bool {
        !matches!(self, Command::Supported)
    }
}

/// 执行子命令，返回进程退出码
pub async fn execute(command: Command, pm: &PackageManager, config: &Config) -> Result<i32> {
    match command {
        Command::Managers => {
            let primary = pm.primary().map(|h| h.name.as_str());
            for handle in pm.handles() {
                let mark = if Some(handle.name.as_str()) == primary { "*" } else { " " };
                println!(
                    "{mark} {:<12} {:<10} {}",
                    handle.name,
                    pm.registry().label_for(&handle.name),
                    handle.executable_path.display()
                );
            }
            Ok(0)
        }
        Command::Supported => {
            for spec in pm.registry().specs() {
                let search = if spec.supports(CommandKind::Search) { "search" } else { "-" };
                println!("{:<12} {:<14} {:<10} {search}", spec.name, spec.executable, spec.label);
            }
            Ok(0)
        }
        Command::List => {
            let load = pm
                .list_installed(&CancellationToken::new(), config.search_timeout())
                .await;
            for (manager, err) in &load.failures {
                eprintln!("warning: {manager}: {err}");
            }
            print_records(&load.records);
            Ok(0)
        }
        Command::Search { term } => {
            if term.trim().is_empty() {
                bail!("search term must not be empty");
            }
            let (records, status) = search_once(pm, &term, config.search_timeout()).await;
            print_records(&records);
            eprintln!("{status}");
            Ok(if status.starts_with("Search failed") { 1 } else { 0 })
        }
        Command::Install { package, manager } => {
            pass_through(pm, manager.as_deref(), CommandKind::Install, Some(&package))
        }
        Command::Remove { package, manager } => {
            pass_through(pm, manager.as_deref(), CommandKind::Uninstall, Some(&package))
        }
        Command::Upgrade {
            package: Some(package),
            manager,
        } => pass_through(pm, manager.as_deref(), CommandKind::Upgrade, Some(&package)),
        Command::Upgrade {
            package: None,
            manager: Some(manager),
        } => {
            let index_ok = match pm.resolve(Some(&manager), CommandKind::UpdateIndex) {
                Ok(_) => pm.run_command(Some(&manager), CommandKind::UpdateIndex, None)?,
                Err(_) => true,
            };
            let ok = index_ok && pm.run_command(Some(&manager), CommandKind::UpgradeAll, None)?;
            Ok(exit_code(ok))
        }
        Command::Upgrade {
            package: None,
            manager: None,
        } => Ok(exit_code(pm.upgrade_all()?)),
    }
}

fn pass_through(pm: &PackageManager, manager: Option<&str>, kind: CommandKind, package: Option<&str>) -> Result<i32> {
    let ok = pm.run_command(manager, kind, package)?;
    Ok(exit_code(ok))
}

fn exit_code(ok: bool) -> i32 {
    if ok {
        0
    } else {
        1
    }
}

fn print_records(records: &[PackageRecord]) {
    for r in records {
        let status = if r.installed { "installed" } else { "" };
        println!("{:<40} {:<10} {:<30} {status}", r.name, r.manager, r.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["lazyinstaller", "install", "vim", "--manager", "snap", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Install { package, manager }) => {
                assert_eq!(package, "vim");
                assert_eq!(manager.as_deref(), Some("snap"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let cli = Cli::try_parse_from(["lazyinstaller", "upgrade"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Upgrade {
                package: None,
                manager: None
            })
        ));

        let cli = Cli::try_parse_from(["lazyinstaller"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_search_requires_term() {
        assert!(Cli::try_parse_from(["lazyinstaller", "search"]).is_err());
    }

    #[test]
    fn test_supported_does_not_need_detection() {
        assert!(!Command::Supported.needs_manager());
        assert!(Command::List.needs_manager());
    }
}
