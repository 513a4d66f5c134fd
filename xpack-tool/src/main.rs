use clap::{Parser, Subcommand};
use xpack_lib::Config;

mod config;
mod fs_utils;
mod install;
mod logging;
mod packaging;
mod process;
mod sink;

use crate::config::{merge_configs, read_config_file, read_env};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browser extension packaging and auto-install tool", long_about = None)]
pub struct Cli {
    /// Directory to package (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Extra glob patterns to leave out, matched against relative paths
    #[arg(short = 's', long, global = true)]
    pub skip: Vec<String>,

    /// Dry run (just list files and the target)
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    pub dry: bool,

    /// Generate YAML config to stdout
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub generate_yaml_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package the directory into an archive
    Build {
        /// Output file, or "-" for stdout [default: extension.xpi]
        output: Option<String>,
    },
    /// Build in memory and POST the archive to an auto-installer listener
    Autoinstall {
        /// PORT or HOST:PORT [default: 8888]
        destination: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging();

    // Step 1: Read environment
    let env_config = read_env();

    // Step 2: Read config file (if exists)
    let mut file_config = Config::default();
    if let Some(path) = cli.config.clone().or(env_config.config.clone()) {
        file_config = read_config_file(&path)?;
    }

    // Step 3: Merge configs: env < file < CLI
    let merged = merge_configs(env_config, file_config, cli_to_config(&cli));

    if cli.generate_yaml_config {
        let yaml = serde_yaml::to_string(&merged)?;
        println!("{yaml}");
        return Ok(());
    }

    match cli.command {
        Command::Build { .. } => process::run_build(&merged),
        Command::Autoinstall { .. } => process::run_autoinstall(&merged),
    }
}

/// Converts CLI struct into Config
fn cli_to_config(cli: &Cli) -> Config {
    let (output, destination) = match &cli.command {
        Command::Build { output } => (output.clone(), None),
        Command::Autoinstall { destination } => (None, destination.clone()),
    };

    Config {
        dir: cli.dir.clone(),
        config: cli.config.clone(),
        output,
        destination,
        skip: if cli.skip.is_empty() {
            None
        } else {
            Some(cli.skip.clone())
        },
        dry: cli.dry.then_some(true),
    }
}
