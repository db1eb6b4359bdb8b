use std::collections::HashMap;

use chrono::NaiveDate;
use log::warn;

use super::models::{Tournament, TournamentId};

/// Collection of tournaments indexed by ID
pub struct TournamentCollection {
    tournaments: HashMap<TournamentId, Tournament>,
}

impl TournamentCollection {
    pub fn new() -> Self {
        Self {
            tournaments: HashMap::new(),
        }
    }

    /// Later records with the same id replace earlier ones
    pub fn add(&mut self, tournament: Tournament) {
        if let Some(previous) = self.tournaments.insert(tournament.id.clone(), tournament) {
            warn!("Tournament {} loaded twice, keeping the last copy", previous.id);
        }
    }

    pub fn len(&self) -> usize {
        self.tournaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Tournament> {
        self.tournaments.get(id)
    }

    pub fn retain_format(&mut self, format: &str) {
        let format = format.trim().to_lowercase();
        self.tournaments.retain(|_, t| t.format == format);
    }

    /// Keep tournaments dated inside the inclusive window
    pub fn retain_window(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.tournaments.retain(|_, t| {
            from.is_none_or(|from| t.date >= from) && to.is_none_or(|to| t.date <= to)
        });
    }

    pub fn deck_count(&self) -> usize {
        self.tournaments.values().map(|t| t.decks.len()).sum()
    }

    /// Tournaments ordered by date, then id
    pub fn into_vec(self) -> Vec<Tournament> {
        let mut tournaments: Vec<Tournament> = self.tournaments.into_values().collect();
        tournaments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        tournaments
    }
}

impl Default for TournamentCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Tournament> for TournamentCollection {
    fn from_iter<I: IntoIterator<Item = Tournament>>(iter: I) -> Self {
        let mut collection = Self::new();
        for tournament in iter {
            collection.add(tournament);
        }
        collection
    }
}
