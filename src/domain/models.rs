use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::normalize::card_key;

pub type TournamentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Mainboard,
    Sideboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub name: String,
    #[serde(rename = "count")]
    pub quantity: u32,
    #[serde(skip)]
    pub zone: Zone,
}

impl Card {
    pub fn new(name: &str, quantity: u32, zone: Zone) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            zone,
        }
    }
}

/// Match record of a single deck in its tournament
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
}

impl Record {
    pub fn new(wins: u32, losses: u32, draws: u32) -> Self {
        Self {
            wins,
            losses,
            draws,
        }
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn decided(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn add(&mut self, other: &Record) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub tournament_id: TournamentId,
    pub player: String,
    pub record: Record,
    pub mainboard: Vec<Card>,
    pub sideboard: Vec<Card>,
}

impl Deck {
    pub fn cards(&self, zone: Zone) -> &[Card] {
        match zone {
            Zone::Mainboard => &self.mainboard,
            Zone::Sideboard => &self.sideboard,
        }
    }

    /// Copies of `name` in `zone`, compared case-insensitively
    pub fn quantity(&self, name: &str, zone: Zone) -> u32 {
        let key = card_key(name);
        self.cards(zone)
            .iter()
            .filter(|c| card_key(&c.name) == key)
            .map(|c| c.quantity)
            .sum()
    }

    pub fn total_cards(&self, zone: Zone) -> u32 {
        self.cards(zone)
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.quantity))
    }
}

/// Tournament after normalisation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub date: NaiveDate,
    pub format: String,
    pub source: String,
    pub decks: Vec<Deck>,
}

/// Round-level result from the collection layer, seen from player A
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default, deserialize_with = "optional_id", alias = "tournament")]
    pub tournament_id: Option<TournamentId>,
    pub round: u32,
    #[serde(alias = "playerA")]
    pub player_a: String,
    #[serde(alias = "playerB")]
    pub player_b: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
}

// --- Input Record Structures ---

/// Raw tournament record as written by the collection layer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TournamentRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: TournamentId,
    #[serde(default)]
    pub name: String,
    pub date: String,
    pub format: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub decks: Vec<DeckRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeckRecord {
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub record: Record,
    #[serde(default)]
    pub mainboard: Vec<CardEntry>,
    #[serde(default)]
    pub sideboard: Vec<CardEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardEntry {
    pub name: String,
    #[serde(alias = "quantity")]
    pub count: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => write!(f, "{}", s),
            RawId::Number(n) => write!(f, "{}", n),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(|id| id.to_string())
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(|id| id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_id_accepts_numbers() {
        let json = r#"{"id": 4411, "date": "2024-03-02", "format": "Modern", "decks": []}"#;
        let record: TournamentRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "4411");
        assert!(record.decks.is_empty());
    }

    #[test]
    fn test_match_result_camel_case_players() {
        let json = r#"{"round": 3, "playerA": "alice", "playerB": "bob", "wins": 2, "losses": 1}"#;
        let result: MatchResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.player_a, "alice");
        assert_eq!(result.player_b, "bob");
        assert_eq!(result.draws, 0);
        assert_eq!(result.tournament_id, None);
    }

    #[test]
    fn test_deck_quantity_ignores_case() {
        let deck = Deck {
            tournament_id: "1".to_string(),
            player: "alice".to_string(),
            record: Record::new(3, 1, 0),
            mainboard: vec![Card::new("Lightning Bolt", 4, Zone::Mainboard)],
            sideboard: vec![Card::new("Smash to Smithereens", 2, Zone::Sideboard)],
        };

        assert_eq!(deck.quantity("lightning bolt", Zone::Mainboard), 4);
        assert_eq!(deck.quantity("Lightning Bolt", Zone::Sideboard), 0);
        assert_eq!(deck.total_cards(Zone::Sideboard), 2);
    }
}
