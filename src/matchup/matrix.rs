use std::collections::{BTreeSet, HashMap};

use log::{info, warn};
use ndarray::Array2;
use serde::Serialize;

use crate::classification::ClassifiedDeck;
use crate::config::{AppConfig, MatchupSettings, MatchupUnit};
use crate::domain::{MatchResult, card_key};
use crate::errors::{MetagameError, MetagameResult};
use crate::statistics::wilson_interval;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// One directed pairing, seen from `archetype_a`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupCell {
    pub archetype_a: String,
    pub archetype_b: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub sample_size: u32,
    /// `None` until at least one decided match or game
    pub win_rate: Option<f64>,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchupMatrix {
    pub archetypes: Vec<String>,
    /// Row-major N×N cells
    pub cells: Vec<MatchupCell>,
    pub unmatched_results: usize,
}

impl MatchupMatrix {
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn cell(&self, a: &str, b: &str) -> Option<&MatchupCell> {
        let n = self.archetypes.len();
        let i = self.archetypes.iter().position(|x| x == a)?;
        let j = self.archetypes.iter().position(|x| x == b)?;
        self.cells.get(i * n + j)
    }

    /// (A,B) and (B,A) must agree on sample size, mirrored counts and
    /// complementary win rates
    pub fn check_symmetry(&self) -> MetagameResult<()> {
        let n = self.archetypes.len();
        if self.cells.len() != n * n {
            return Err(MetagameError::aggregation(
                "matchup matrix",
                format!("{} cells for {} archetypes", self.cells.len(), n),
            ));
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let ab = &self.cells[i * n + j];
                let ba = &self.cells[j * n + i];
                let subject = || format!("{} vs {}", ab.archetype_a, ab.archetype_b);

                if ab.sample_size != ba.sample_size {
                    return Err(MetagameError::aggregation(
                        subject(),
                        format!("sample sizes differ ({} vs {})", ab.sample_size, ba.sample_size),
                    ));
                }
                if ab.wins != ba.losses || ab.losses != ba.wins || ab.draws != ba.draws {
                    return Err(MetagameError::aggregation(subject(), "mirrored records differ"));
                }
                if let (Some(x), Some(y)) = (ab.win_rate, ba.win_rate) {
                    if (x + y - 1.0).abs() > SYMMETRY_TOLERANCE {
                        return Err(MetagameError::aggregation(
                            subject(),
                            format!("win rates {} and {} do not sum to 1", x, y),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Looks up the archetype behind a player of a match result
struct DeckIndex {
    by_entry: HashMap<(String, String), String>,
    /// `None` when the player name appears in more than one deck
    by_player: HashMap<String, Option<String>>,
}

impl DeckIndex {
    fn new(decks: &[ClassifiedDeck]) -> Self {
        let mut by_entry = HashMap::new();
        let mut by_player: HashMap<String, Option<String>> = HashMap::new();

        for deck in decks {
            let player = card_key(&deck.deck.player);
            by_entry.insert(
                (deck.deck.tournament_id.clone(), player.clone()),
                deck.archetype.clone(),
            );
            by_player
                .entry(player)
                .and_modify(|archetype| *archetype = None)
                .or_insert_with(|| Some(deck.archetype.clone()));
        }

        Self { by_entry, by_player }
    }

    fn archetype(&self, tournament_id: Option<&str>, player: &str) -> Option<&str> {
        let player = card_key(player);
        match tournament_id {
            Some(id) => self.by_entry.get(&(id.to_string(), player)).map(String::as_str),
            None => self.by_player.get(&player)?.as_deref(),
        }
    }
}

pub struct MatchupMatrixBuilder {
    settings: MatchupSettings,
    confidence_level: f64,
}

impl MatchupMatrixBuilder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            settings: config.matchups.clone(),
            confidence_level: config.statistics.confidence_level,
        }
    }

    /// Joins results to classified decks and counts every archetype pairing
    pub fn build(
        &self,
        decks: &[ClassifiedDeck],
        results: &[MatchResult],
    ) -> MetagameResult<MatchupMatrix> {
        let archetypes: Vec<String> = decks
            .iter()
            .map(|d| d.archetype.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if archetypes.is_empty() {
            return Ok(MatchupMatrix {
                unmatched_results: results.len(),
                ..MatchupMatrix::default()
            });
        }

        let position: HashMap<&str, usize> = archetypes
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let index = DeckIndex::new(decks);

        let n = archetypes.len();
        let mut wins = Array2::<u32>::zeros((n, n));
        let mut draws = Array2::<u32>::zeros((n, n));
        let mut played = Array2::<u32>::zeros((n, n));
        let mut unmatched_results = 0;

        for result in results {
            let tournament = result.tournament_id.as_deref();
            let pair = index
                .archetype(tournament, &result.player_a)
                .zip(index.archetype(tournament, &result.player_b));
            let Some((a, b)) = pair else {
                unmatched_results += 1;
                continue;
            };
            let (i, j) = (position[a], position[b]);

            let (w, l, d, units) = self.score(result);
            if i == j {
                wins[[i, i]] += w + l;
                draws[[i, i]] += d;
                played[[i, i]] += units;
            } else {
                wins[[i, j]] += w;
                wins[[j, i]] += l;
                draws[[i, j]] += d;
                draws[[j, i]] += d;
                played[[i, j]] += units;
                played[[j, i]] += units;
            }
        }

        if unmatched_results > 0 {
            warn!(
                "{} of {} match results could not be joined to a classified deck",
                unmatched_results,
                results.len()
            );
        }
        info!(
            "  → Matchup matrix over {} archetypes from {} results",
            n,
            results.len() - unmatched_results
        );

        let mut cells = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let cell = if i == j {
                    self.mirror_cell(&archetypes[i], wins[[i, i]], draws[[i, i]], played[[i, i]])
                } else {
                    self.cell(
                        &archetypes[i],
                        &archetypes[j],
                        wins[[i, j]],
                        wins[[j, i]],
                        draws[[i, j]],
                        played[[i, j]],
                    )
                };
                cells.push(cell);
            }
        }

        let matrix = MatchupMatrix {
            archetypes,
            cells,
            unmatched_results,
        };
        matrix.check_symmetry()?;

        Ok(matrix)
    }

    /// (wins, losses, draws, sample units) of one result under the configured unit
    fn score(&self, result: &MatchResult) -> (u32, u32, u32, u32) {
        match self.settings.unit {
            MatchupUnit::Matches => {
                if result.wins > result.losses {
                    (1, 0, 0, 1)
                } else if result.wins < result.losses {
                    (0, 1, 0, 1)
                } else {
                    (0, 0, 1, 1)
                }
            }
            MatchupUnit::Games => (
                result.wins,
                result.losses,
                result.draws,
                result.wins + result.losses + result.draws,
            ),
        }
    }

    fn cell(
        &self,
        a: &str,
        b: &str,
        wins: u32,
        losses: u32,
        draws: u32,
        sample_size: u32,
    ) -> MatchupCell {
        let decided = wins + losses;
        let interval = wilson_interval(wins, decided, self.confidence_level);

        MatchupCell {
            archetype_a: a.to_string(),
            archetype_b: b.to_string(),
            wins,
            losses,
            draws,
            sample_size,
            win_rate: (decided > 0).then(|| wins as f64 / decided as f64),
            ci_lower: interval.lower,
            ci_upper: interval.upper,
            insufficient_data: sample_size < self.settings.min_sample_size,
        }
    }

    /// Every decided unit of a mirror is one win and one loss for the same
    /// archetype, so the win rate is 0.5 and the interval stays at [0, 1]
    fn mirror_cell(
        &self,
        archetype: &str,
        decided: u32,
        draws: u32,
        sample_size: u32,
    ) -> MatchupCell {
        MatchupCell {
            archetype_a: archetype.to_string(),
            archetype_b: archetype.to_string(),
            wins: decided,
            losses: decided,
            draws,
            sample_size,
            win_rate: (decided > 0).then_some(0.5),
            ci_lower: 0.0,
            ci_upper: 1.0,
            insufficient_data: sample_size < self.settings.min_sample_size,
        }
    }
}
