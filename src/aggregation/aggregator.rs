use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use super::dedup::deduplicate;
use crate::classification::{ClassifiedDeck, Resolution};
use crate::config::AggregationSettings;
use crate::domain::Record;
use crate::errors::{MetagameError, MetagameResult};

/// Raw counts for one archetype (or archetype + colors) in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeGroup {
    pub archetype: String,
    pub colors: Option<String>,
    pub deck_count: u32,
    pub record: Record,
    pub meta_share: f64,
}

impl ArchetypeGroup {
    /// Report name: archetype, plus the color label when grouping by colors
    pub fn display_name(&self) -> String {
        match &self.colors {
            Some(colors) => format!("{} ({})", self.archetype, colors),
            None => self.archetype.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetagameSnapshot {
    pub total_decks: u32,
    pub groups: Vec<ArchetypeGroup>,
    pub duplicates_removed: usize,
    pub unclassified_decks: u32,
}

impl MetagameSnapshot {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn shares(&self) -> Vec<f64> {
        self.groups.iter().map(|g| g.meta_share).collect()
    }

    pub fn most_played(&self) -> Option<&ArchetypeGroup> {
        self.groups.iter().max_by(|a, b| {
            a.deck_count
                .cmp(&b.deck_count)
                .then_with(|| b.archetype.cmp(&a.archetype))
        })
    }

    /// Highest raw win rate among groups with at least `min_matches` matches
    pub fn best_performing(&self, min_matches: u32) -> Option<&ArchetypeGroup> {
        self.groups
            .iter()
            .filter(|g| g.record.matches_played() >= min_matches && g.record.decided() > 0)
            .max_by(|a, b| raw_win_rate(a).total_cmp(&raw_win_rate(b)))
    }

    pub fn group(&self, name: &str) -> Option<&ArchetypeGroup> {
        self.groups.iter().find(|g| g.display_name() == name)
    }
}

fn raw_win_rate(group: &ArchetypeGroup) -> f64 {
    group.record.wins as f64 / group.record.decided() as f64
}

pub struct MetagameAggregator {
    settings: AggregationSettings,
}

impl MetagameAggregator {
    pub fn new(settings: AggregationSettings) -> Self {
        Self { settings }
    }

    /// Group key of a deck under the current settings
    pub fn group_key(&self, deck: &ClassifiedDeck) -> (String, Option<String>) {
        let colors = self
            .settings
            .group_by_colors
            .then(|| deck.color_identity.label().to_string());
        (deck.archetype.clone(), colors)
    }

    /// Name the deck's group carries in reports
    pub fn group_name(&self, deck: &ClassifiedDeck) -> String {
        match self.group_key(deck) {
            (archetype, Some(colors)) => format!("{} ({})", archetype, colors),
            (archetype, None) => archetype,
        }
    }

    pub fn aggregate(&self, decks: &[ClassifiedDeck]) -> MetagameResult<MetagameSnapshot> {
        let outcome = deduplicate(decks);
        if outcome.removed > 0 {
            info!("  → Removed {} duplicate decks", outcome.removed);
        }

        if outcome.decks.is_empty() {
            return Ok(MetagameSnapshot {
                duplicates_removed: outcome.removed,
                ..MetagameSnapshot::default()
            });
        }

        let mut counts: BTreeMap<(String, Option<String>), (u32, Record)> = BTreeMap::new();
        let mut unclassified_decks = 0;
        for deck in &outcome.decks {
            if deck.resolution == Resolution::Unclassified {
                unclassified_decks += 1;
            }
            let entry = counts.entry(self.group_key(deck)).or_default();
            entry.0 += 1;
            entry.1.add(&deck.deck.record);
        }

        let total_decks = outcome.decks.len() as u32;
        let mut groups: Vec<ArchetypeGroup> = counts
            .into_iter()
            .map(|((archetype, colors), (deck_count, record))| ArchetypeGroup {
                archetype,
                colors,
                deck_count,
                record,
                meta_share: deck_count as f64 / total_decks as f64,
            })
            .collect();
        groups.sort_by(|a, b| {
            b.deck_count
                .cmp(&a.deck_count)
                .then_with(|| a.display_name().cmp(&b.display_name()))
        });

        let snapshot = MetagameSnapshot {
            total_decks,
            groups,
            duplicates_removed: outcome.removed,
            unclassified_decks,
        };
        self.check_shares(&snapshot)?;

        Ok(snapshot)
    }

    fn check_shares(&self, snapshot: &MetagameSnapshot) -> MetagameResult<()> {
        let total: f64 = snapshot.shares().iter().sum();
        if (total - 1.0).abs() > self.settings.meta_share_epsilon {
            return Err(MetagameError::aggregation(
                format!("batch of {} decks", snapshot.total_decks),
                format!("meta shares sum to {} instead of 1", total),
            ));
        }

        let counted: u32 = snapshot.groups.iter().map(|g| g.deck_count).sum();
        if counted != snapshot.total_decks {
            return Err(MetagameError::aggregation(
                format!("batch of {} decks", snapshot.total_decks),
                format!("groups hold {} decks", counted),
            ));
        }

        Ok(())
    }
}
