use clap::{Args, Parser, Subcommand};
use installer_cpp::global_config::GlobalConfig;
use installer_cpp::utils::{log, InstallConfig, LogLevel};
use installer_cpp::{bin_flags, InstallError};
use std::path::PathBuf;

const LOG_LEVEL_HELP: &str = "Environment variables:
  INSTALLER_CPP_LOG_LEVEL  Set the log level (Debug, Info, Log, Warn, Error)";

/// A minimal installer for C and C++ projects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = LOG_LEVEL_HELP)]
struct Cli {
    /// The install manifest
    #[arg(short, long, default_value = "install.toml", global = true)]
    manifest: PathBuf,

    #[command(flatten)]
    dirs: DirArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DirArgs {
    /// The installation prefix (default: /usr/local)
    #[arg(long, global = true)]
    prefix: Option<String>,
    /// The installation exec prefix (default: the prefix)
    #[arg(long, global = true)]
    eprefix: Option<String>,
    /// The installation bin directory (default: <prefix>/bin)
    #[arg(long, global = true)]
    bindir: Option<String>,
    /// The installation lib directory (default: <prefix>/lib)
    #[arg(long, global = true)]
    libdir: Option<String>,
    /// The installation include directory (default: <prefix>/include)
    #[arg(long, global = true)]
    includedir: Option<String>,
    /// The installation share directory (default: <prefix>/share)
    #[arg(long, global = true)]
    sharedir: Option<String>,
}

impl From<DirArgs> for InstallConfig {
    fn from(args: DirArgs) -> Self {
        InstallConfig {
            prefix: args.prefix,
            eprefix: args.eprefix,
            bindir: args.bindir,
            libdir: args.libdir,
            includedir: args.includedir,
            sharedir: args.sharedir,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved directories and every staged action
    Plan,
    /// Copy the staged files into place
    Install {
        /// Only print what would be installed
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Remove previously installed files
    Uninstall {
        /// Only print what would be removed
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Set a global default. Valid parameters: default_prefix
    Config { parameter: String, value: String },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log(LogLevel::Error, &e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), InstallError> {
    if let Command::Config { parameter, value } = &cli.command {
        let path = GlobalConfig::default_path().ok_or_else(|| {
            InstallError::Configuration("no config directory on this platform".to_string())
        })?;
        return GlobalConfig::set_defaults(&path, parameter, value);
    }

    let global = GlobalConfig::load()?;
    let base = std::env::current_dir().map_err(|e| InstallError::Io {
        action: "resolve",
        path: PathBuf::from("."),
        source: e,
    })?;
    let installer = bin_flags::stage(&cli.manifest, &cli.dirs.into(), &global, &base)?;

    match cli.command {
        Command::Plan => bin_flags::plan(&installer),
        Command::Install { dry_run } => bin_flags::install(&installer, dry_run)?,
        Command::Uninstall { dry_run } => bin_flags::uninstall(&installer, dry_run)?,
        Command::Config { .. } => {}
    }
    Ok(())
}
