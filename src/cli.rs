//! CLI argument parsing for the taqsit-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::ImportTarget;

#[derive(Parser)]
#[command(name = "taqsit-worker", about = "Taqsit installment-sales import worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Import a spreadsheet from the local filesystem
    Import {
        /// Path to the spreadsheet (xlsx, xls, ods or csv)
        file: PathBuf,
        /// Destination table
        #[arg(long)]
        target: CliTarget,
        /// Sheet name; defaults to the first sheet
        #[arg(long)]
        sheet: Option<String>,
        /// Column mapping as header=field, repeatable
        #[arg(long = "map", value_name = "HEADER=FIELD")]
        mappings: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliTarget {
    Customer,
    Transaction,
    Payment,
}

impl From<CliTarget> for ImportTarget {
    fn from(value: CliTarget) -> Self {
        match value {
            CliTarget::Customer => ImportTarget::Customer,
            CliTarget::Transaction => ImportTarget::Transaction,
            CliTarget::Payment => ImportTarget::Payment,
        }
    }
}

/// Splits repeatable `header=field` arguments into a mapping.
pub fn parse_mappings(args: &[String]) -> Result<std::collections::HashMap<String, String>, String> {
    let mut mappings = std::collections::HashMap::new();
    for arg in args {
        let Some((header, field)) = arg.split_once('=') else {
            return Err(format!("invalid mapping '{arg}', expected HEADER=FIELD"));
        };
        mappings.insert(header.trim().to_string(), field.trim().to_string());
    }
    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_migrate_command_parses() {
        let cli = Cli::parse_from(["taqsit-worker", "migrate"]);
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["taqsit-worker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_import_command_parses() {
        let cli = Cli::parse_from([
            "taqsit-worker",
            "import",
            "data.xlsx",
            "--target",
            "customer",
            "--map",
            "كود=sequence_number",
            "--map",
            "الاسم الكامل=full_name",
        ]);
        match cli.command {
            Some(Command::Import {
                target, mappings, ..
            }) => {
                assert_eq!(target, CliTarget::Customer);
                assert_eq!(mappings.len(), 2);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_parse_mappings_splits_on_equals() {
        let mappings =
            parse_mappings(&["كود=sequence_number".to_string()]).unwrap();
        assert_eq!(
            mappings.get("كود"),
            Some(&"sequence_number".to_string())
        );
    }

    #[test]
    fn test_parse_mappings_rejects_missing_equals() {
        assert!(parse_mappings(&["just-a-header".to_string()]).is_err());
    }
}
