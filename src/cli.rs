use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "metagame archetype classification and statistics")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Classify every decklist and write the classified deck list
    Classify(RunArgs),
    /// Classify, aggregate and write the full statistics report
    Analyze(RunArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Format to analyze (matches the rule file name)
    #[arg(short, long)]
    pub format: String,

    /// Directory of normalized tournament JSON files
    #[arg(short, long, default_value = "data/tournaments")]
    pub tournaments: PathBuf,

    /// Directory of per-format rule files
    #[arg(short, long, default_value = "data/rules")]
    pub rules: PathBuf,

    /// Card catalog JSON used for color identity
    #[arg(long)]
    pub cards: Option<PathBuf>,

    /// Round-level match results feed
    #[arg(long)]
    pub matches: Option<PathBuf>,

    /// Output directory for the JSON reports
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// First tournament date to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last tournament date to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Abort the batch when it runs longer than this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// JSON config file (defaults to $METAGAME_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "metagame",
            "analyze",
            "--format",
            "modern",
            "--from",
            "2024-01-01",
            "--deadline-secs",
            "30",
        ]);

        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.format, "modern");
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.deadline_secs, Some(30));
        assert_eq!(args.rules, PathBuf::from("data/rules"));
    }
}
