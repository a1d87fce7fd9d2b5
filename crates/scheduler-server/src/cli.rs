use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A small task scheduler with repeating deadlines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeCommand),
    /// Print the next occurrence of a repeat rule
    NextDate(NextDateCommand),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve(ServeCommand::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
    /// SQLite database file
    #[arg(long)]
    pub database: Option<String>,
    /// Directory with the static front end
    #[arg(long)]
    pub web_dir: Option<String>,
}

impl ServeCommand {
    /// Flags given on the command line win over every other source.
    pub fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(web_dir) = self.web_dir {
            config.web_dir = web_dir;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct NextDateCommand {
    /// Reference date, YYYYMMDD
    #[arg(long)]
    pub now: String,
    /// Base date of the task, YYYYMMDD
    #[arg(long)]
    pub date: String,
    /// Repeat rule, e.g. "d 7" or "y"
    #[arg(long)]
    pub repeat: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["scheduler"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.command.unwrap_or_default(), Commands::Serve(_)));
    }

    #[test]
    fn test_serve_flags_override_config() {
        let cli = Cli::try_parse_from([
            "scheduler",
            "serve",
            "--port",
            "8000",
            "--database",
            "/tmp/x.db",
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));

        let mut config = Config {
            timezone: "UTC".to_string(),
            ..Config::default()
        };
        match cli.command {
            Some(Commands::Serve(serve)) => serve.apply(&mut config),
            other => panic!("expected serve, got {:?}", other),
        }
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_path, "/tmp/x.db");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_next_date_requires_all_arguments() {
        assert!(Cli::try_parse_from(["scheduler", "next-date", "--now", "20240101"]).is_err());

        let cli = Cli::try_parse_from([
            "scheduler",
            "next-date",
            "--now",
            "20240126",
            "--date",
            "20240113",
            "--repeat",
            "d 7",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::NextDate(cmd)) => assert_eq!(cmd.repeat, "d 7"),
            other => panic!("expected next-date, got {:?}", other),
        }
    }
}
