use clap::{Parser, Subcommand};
use distiller_migrate::config::LoggingSettings;
use distiller_migrate::debug::DebugConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "distiller-migrate",
    author = "Pamir AI",
    version,
    about = "Migrate a Distiller device from the unstable to the testing apt channel",
    long_about = "One-shot repository migration for Distiller devices. Switches the apt sources to the testing channel, installs the genesis package for the detected platform and removes its own systemd unit when done"
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "DISTILLER_MIGRATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Without a subcommand the migration is run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the detected platform, genesis package and hardware profile as JSON
    Detect,
    /// Show whether the migration has completed
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// サブコマンドに応じたログ設定
    ///
    /// 報告系のコマンドは stderr に WARN 以上だけを出し、ログファイルには書かない。
    pub fn debug_config(&self, logging: &LoggingSettings) -> DebugConfig {
        match self.command {
            Some(_) => DebugConfig::stderr_only("warn"),
            None => DebugConfig::from_settings(logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_migration() {
        let cli = Cli::try_parse_from(["distiller-migrate"]).unwrap();
        assert!(cli.command.is_none());

        let debug = cli.debug_config(&LoggingSettings::default());
        assert!(debug.log_file.is_some());
        assert!(!debug.console_to_stderr);
    }

    #[test]
    fn test_detect_with_config() {
        let cli =
            Cli::try_parse_from(["distiller-migrate", "--config", "/tmp/m.toml", "detect"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Detect)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
    }

    #[test]
    fn test_status_flags() {
        let cli = Cli::try_parse_from(["distiller-migrate", "status"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: false })));

        let cli = Cli::try_parse_from(["distiller-migrate", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
    }

    #[test]
    fn test_reporting_commands_log_to_stderr_only() {
        for args in [
            vec!["distiller-migrate", "detect"],
            vec!["distiller-migrate", "status"],
            vec!["distiller-migrate", "config"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            let debug = cli.debug_config(&LoggingSettings::default());
            assert!(debug.console_to_stderr);
            assert!(debug.log_file.is_none());
            assert_eq!(debug.log_level, "warn");
        }
    }
}
