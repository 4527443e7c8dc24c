mod cli;
mod config;
mod package_manager;
mod search;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use package_manager::PackageManager;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置：命令行指定的路径必须存在
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default()?,
    };

    let interactive = cli.command.is_none();
    init_logging(cli.verbose || config.verbose, config.log_path(interactive))?;

    let pm = PackageManager::detect(&config.disabled_managers);
    for diagnostic in pm.diagnostics() {
        log::warn!("{diagnostic}");
    }

    match cli.command {
        Some(command) => {
            if command.needs_manager() && pm.is_empty() {
                eprintln!("error: no supported package manager found");
                for diagnostic in pm.diagnostics() {
                    eprintln!("  {diagnostic}");
                }
                std::process::exit(1);
            }
            let code = cli::execute(command, &pm, &config).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        None => tui::run(pm, config).await?,
    }

    Ok(())
}

/// 默认 warn，verbose 时 debug，RUST_LOG 优先
///
/// 给出路径时日志写入文件，否则写 stderr。
fn init_logging(verbose: bool, log_path: Option<PathBuf>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if let Some(path) = &log_path {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
