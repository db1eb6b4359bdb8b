use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;

use crate::aggregation::{MetagameAggregator, deduplicate};
use crate::classification::{CardCatalog, ClassificationEngine, ClassifiedDeck};
use crate::config::AppConfig;
use crate::domain::{
    LoadProgress, MatchResult, Tournament, TournamentCollection, TournamentId, TournamentRecord,
};
use crate::errors::{ClassificationAmbiguity, MetagameError, MetagameResult, load_context};
use crate::loader::{JsonStore, list_json_files, read_json};
use crate::matchup::{MatchupMatrix, MatchupMatrixBuilder};
use crate::rules::RuleRepository;
use crate::statistics::{StatisticsEngine, StatisticsReport};

pub const CLASSIFIED_DECKS_KEY: &str = "classified_decks";
pub const ARCHETYPE_STATISTICS_KEY: &str = "archetype_statistics";
pub const MATCHUP_MATRIX_KEY: &str = "matchup_matrix";
pub const REPORT_KEY: &str = "report";

/// Inputs of one batch run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub format: String,
    pub tournaments_dir: PathBuf,
    pub rules_dir: PathBuf,
    pub cards: Option<PathBuf>,
    pub matches: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub deadline: Option<Duration>,
}

#[derive(Debug)]
pub struct ClassificationRun {
    pub decks: Vec<ClassifiedDeck>,
    pub ambiguities: Vec<ClassificationAmbiguity>,
    pub tournament_dates: HashMap<TournamentId, NaiveDate>,
    pub skipped_files: usize,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub classified: ClassificationRun,
    pub report: StatisticsReport,
    pub matchups: Option<MatchupMatrix>,
}

pub struct AnalysisService {
    config: AppConfig,
    request: AnalysisRequest,
    started: Instant,
}

impl AnalysisService {
    pub fn new(config: AppConfig, request: AnalysisRequest) -> Self {
        Self {
            config,
            request,
            started: Instant::now(),
        }
    }

    /// Load and classify, writing the classified deck list
    pub fn classify(&self) -> Result<ClassificationRun> {
        info!("=== Classifying {} decklists ===\n", self.request.format);

        let run = self.classify_decks()?;
        let store = JsonStore::new(&self.request.output_dir)?;
        store.save(CLASSIFIED_DECKS_KEY, &run.decks)?;

        info!("=== Classification Complete ===");
        Ok(run)
    }

    /// Full batch: classification, aggregation, statistics and matchups
    pub fn run(&self) -> Result<AnalysisOutcome> {
        info!("=== Starting Metagame Analysis ({}) ===\n", self.request.format);

        let classified = self.classify_decks()?;

        let aggregator = MetagameAggregator::new(self.config.aggregation.clone());
        let snapshot = aggregator.aggregate(&classified.decks)?;
        info!(
            "  → Aggregated {} decks into {} groups\n",
            snapshot.total_decks,
            snapshot.groups.len()
        );
        self.check_deadline("aggregation")?;

        let observations = trend_observations(&aggregator, &classified);
        let mut report = StatisticsEngine::new(&self.config).compute(&snapshot, &observations);
        report.ambiguities = classified.ambiguities.clone();
        self.check_deadline("statistics")?;

        let matchups = match &self.request.matches {
            Some(path) => Some(self.build_matchups(path, &classified.decks)?),
            None => None,
        };
        self.check_deadline("matchups")?;

        self.write_outputs(&classified, &report, matchups.as_ref())?;

        info!("=== Analysis Complete ===");
        Ok(AnalysisOutcome {
            classified,
            report,
            matchups,
        })
    }

    fn classify_decks(&self) -> Result<ClassificationRun> {
        self.config.validate()?;
        let repository = RuleRepository::load(&self.request.rules_dir)?;
        info!("  → Rule files for: {}", repository.formats().join(", "));
        let failed = repository.failed_formats();
        if !failed.is_empty() {
            warn!("  ⚠ Unusable rule files for: {}", failed.join(", "));
        }
        let rules = repository.get_definitions(&self.request.format)?;
        info!("  → Loaded {} archetype definitions\n", rules.len());

        let catalog = self.load_catalog()?;
        self.check_deadline("loading rules")?;

        let (collection, skipped_files) = self.load_tournaments()?;
        self.check_deadline("loading tournaments")?;

        let tournaments = collection.into_vec();
        let tournament_dates: HashMap<TournamentId, NaiveDate> = tournaments
            .iter()
            .map(|t| (t.id.clone(), t.date))
            .collect();
        let decks: Vec<_> = tournaments.into_iter().flat_map(|t| t.decks).collect();

        let engine = ClassificationEngine::new(rules, &catalog, &self.config.classification);
        let (decks, ambiguities) = engine.classify_all(decks);
        info!(
            "  → Classified {} decks ({} ambiguous)\n",
            decks.len(),
            ambiguities.len()
        );
        self.check_deadline("classification")?;

        Ok(ClassificationRun {
            decks,
            ambiguities,
            tournament_dates,
            skipped_files,
        })
    }

    fn load_catalog(&self) -> Result<CardCatalog> {
        let Some(path) = &self.request.cards else {
            warn!("No card catalog given; color identities will be empty");
            return Ok(CardCatalog::new());
        };

        let catalog = CardCatalog::load(path).with_context(|| load_context("card catalog", path))?;
        info!("  → Loaded {} cards into the catalog", catalog.len());
        Ok(catalog)
    }

    /// Tournament files are parsed in parallel; a bad file is logged and skipped
    fn load_tournaments(&self) -> Result<(TournamentCollection, usize)> {
        let files = list_json_files(&self.request.tournaments_dir)?;
        let mut progress = LoadProgress::new(files.len());

        let parsed: Vec<(PathBuf, Result<Tournament>)> = files
            .into_par_iter()
            .map(|path| {
                let tournament = load_tournament(&path);
                (path, tournament)
            })
            .collect();

        let mut collection = TournamentCollection::new();
        for (path, tournament) in parsed {
            match tournament {
                Ok(tournament) => {
                    collection.add(tournament);
                    progress.increment_loaded();
                }
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    progress.increment_skipped();
                }
            }
        }

        collection.retain_format(&self.request.format);
        collection.retain_window(self.request.from, self.request.to);
        info!(
            "  → {} {} tournaments with {} decks in range\n",
            collection.len(),
            self.request.format,
            collection.deck_count()
        );

        Ok((collection, progress.skipped()))
    }

    fn build_matchups(&self, path: &Path, decks: &[ClassifiedDeck]) -> Result<MatchupMatrix> {
        let results: Vec<MatchResult> =
            read_json(path).with_context(|| load_context("match results", path))?;
        info!("  → Loaded {} match results", results.len());

        let matrix = MatchupMatrixBuilder::new(&self.config).build(decks, &results)?;
        Ok(matrix)
    }

    fn write_outputs(
        &self,
        classified: &ClassificationRun,
        report: &StatisticsReport,
        matchups: Option<&MatchupMatrix>,
    ) -> Result<()> {
        let store = JsonStore::new(&self.request.output_dir)?;
        store.save(CLASSIFIED_DECKS_KEY, &classified.decks)?;
        store.save(ARCHETYPE_STATISTICS_KEY, &report.archetypes)?;
        if let Some(matrix) = matchups {
            store.save(MATCHUP_MATRIX_KEY, &matrix.cells)?;
        }
        store.save(REPORT_KEY, report)?;
        Ok(())
    }

    fn check_deadline(&self, stage: &str) -> MetagameResult<()> {
        match self.request.deadline {
            Some(deadline) if self.started.elapsed() > deadline => {
                Err(MetagameError::DeadlineExceeded {
                    stage: stage.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn load_tournament(path: &Path) -> Result<Tournament> {
    let record: TournamentRecord = read_json(path)?;
    let tournament = record.into_tournament()?;
    Ok(tournament)
}

/// (tournament date, group name) for every deck counted by the aggregator
fn trend_observations(
    aggregator: &MetagameAggregator,
    classified: &ClassificationRun,
) -> Vec<(NaiveDate, String)> {
    deduplicate(&classified.decks)
        .decks
        .into_iter()
        .filter_map(|deck| {
            let date = classified.tournament_dates.get(&deck.deck.tournament_id)?;
            Some((*date, aggregator.group_name(deck)))
        })
        .collect()
}
