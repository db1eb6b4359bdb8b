pub mod aggregation;
pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod loader;
pub mod matchup;
pub mod rules;
pub mod services;
pub mod statistics;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::Colorize;

use crate::cli::{Command, RunArgs};
use crate::config::AppConfig;
use crate::services::{AnalysisRequest, AnalysisService};
use crate::statistics::StatisticsReport;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_classify(args: &RunArgs) -> Result<()> {
    let service = build_service(args)?;
    let run = service.classify()?;

    println!(
        "Classified {} decks ({} files skipped, {} ambiguous)",
        run.decks.len(),
        run.skipped_files,
        run.ambiguities.len()
    );
    Ok(())
}

pub fn handle_analyze(args: &RunArgs) -> Result<()> {
    let service = build_service(args)?;
    let outcome = service.run()?;

    print_summary(&outcome.report);
    if let Some(matrix) = &outcome.matchups {
        println!(
            "Matchup matrix: {} archetypes, {} unmatched results",
            matrix.archetypes.len(),
            matrix.unmatched_results
        );
    }
    Ok(())
}

fn build_service(args: &RunArgs) -> Result<AnalysisService> {
    let config = AppConfig::load(args.config.as_deref())?;
    let request = AnalysisRequest {
        format: args.format.to_lowercase(),
        tournaments_dir: args.tournaments.clone(),
        rules_dir: args.rules.clone(),
        cards: args.cards.clone(),
        matches: args.matches.clone(),
        output_dir: args.output.clone(),
        from: args.from,
        to: args.to,
        deadline: args.deadline_secs.map(Duration::from_secs),
    };
    Ok(AnalysisService::new(config, request))
}

fn print_summary(report: &StatisticsReport) {
    if report.is_empty() {
        println!("{}", "No classified decks in range".yellow());
        return;
    }

    println!(
        "{} decks, {} archetypes, effective archetypes {:.2}",
        report.total_decks, report.archetype_count, report.diversity.effective_archetypes
    );

    for stat in &report.archetypes {
        let tier = match stat.tier.as_deref() {
            Some("Tier 1") => "Tier 1".green().bold(),
            Some(tier) => tier.normal(),
            None => "insufficient data".dimmed(),
        };
        println!(
            "  {:<32} {:>5.1}%  win {:>5.1}% [{:.1}, {:.1}]  {}",
            stat.archetype,
            stat.meta_share * 100.0,
            stat.win_rate * 100.0,
            stat.ci_lower * 100.0,
            stat.ci_upper * 100.0,
            tier
        );
    }

    if !report.warnings.is_empty() {
        println!(
            "{}",
            format!("{} archetypes below the sample threshold", report.warnings.len()).yellow()
        );
    }
}
