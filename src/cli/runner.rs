//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::EtlConfig;
use crate::error::Result;
use crate::pipeline;
use crate::session::Session;
use crate::tables::ALL_TABLES;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { input, output } => {
                self.run_pipeline(input.as_deref(), output.as_deref())
                    .await
            }
            Commands::Validate => self.validate(),
            Commands::Tables => {
                self.tables();
                Ok(())
            }
        }
    }

    /// Load configuration and apply command-line overrides
    fn load_config(&self, input: Option<&str>, output: Option<&str>) -> Result<EtlConfig> {
        let mut config = EtlConfig::load(self.cli.config.as_deref())?;
        if let Some(input) = input {
            config = config.with_input(input);
        }
        if let Some(output) = output {
            config = config.with_output(output);
        }
        config.validate()?;
        Ok(config)
    }

    /// Run the full pipeline
    async fn run_pipeline(&self, input: Option<&str>, output: Option<&str>) -> Result<()> {
        let config = self.load_config(input, output)?;
        let session = Session::new(config)?;
        let summary = pipeline::run(&session).await?;

        self.output_message(&serde_json::to_value(&summary)?);
        Ok(())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config(None, None)?;

        self.output_message(&json!({
            "valid": true,
            "config": serde_json::to_value(config.redacted())?,
        }));
        Ok(())
    }

    /// List output tables
    fn tables(&self) {
        let tables: Vec<Value> = ALL_TABLES
            .iter()
            .map(|table| {
                json!({
                    "name": table.name,
                    "partition_by": table.partition_columns(),
                })
            })
            .collect();

        self.output_message(&json!({ "tables": tables }));
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "sparkify-etl",
            "-C",
            "conf/dl.yaml",
            "run",
            "--input",
            "/data/in",
            "--output",
            "/data/out",
        ]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("conf/dl.yaml")));
        match cli.command {
            Commands::Run { input, output } => {
                assert_eq!(input.as_deref(), Some("/data/in"));
                assert_eq!(output.as_deref(), Some("/data/out"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = Cli::parse_from(["sparkify-etl", "tables", "-v", "--format", "pretty"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(matches!(cli.command, Commands::Tables));
    }

    #[test]
    fn test_load_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl.yaml");
        std::fs::write(&path, "input: /from/file\noutput: /from/file/out\n").unwrap();

        let cli = Cli::parse_from([
            "sparkify-etl",
            "-C",
            path.to_str().unwrap(),
            "run",
            "--output",
            "/from/flag",
        ]);
        let config = Runner::new(cli)
            .load_config(None, Some("/from/flag"))
            .unwrap();
        assert_eq!(config.input, "/from/file");
        assert_eq!(config.output, "/from/flag");
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::parse_from(["sparkify-etl", "-C", "/nonexistent/dl.yaml", "validate"]);
        assert!(Runner::new(cli).load_config(None, None).is_err());
    }
}
