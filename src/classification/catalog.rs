use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::card_key;
use crate::errors::{MetagameError, MetagameResult};
use crate::loader::read_text;

/// Card facts needed to derive colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub name: String,
    #[serde(default, alias = "manaCost")]
    pub mana_cost: String,
    #[serde(default, alias = "typeLine")]
    pub type_line: String,
}

impl CardInfo {
    pub fn is_land(&self) -> bool {
        self.type_line.contains("Land")
    }
}

/// Card name lookup, case-insensitive, with front-face fallback for split cards
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<String, CardInfo>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> MetagameResult<Self> {
        let json = read_text(path)?;
        let cards: Vec<CardInfo> = serde_json::from_str(&json).map_err(|e| {
            MetagameError::invalid_record(format!("card catalog {}", path.display()), e)
        })?;
        Ok(cards.into_iter().collect())
    }

    pub fn insert(&mut self, card: CardInfo) {
        if let Some(front) = front_face(&card.name) {
            self.cards
                .entry(card_key(front))
                .or_insert_with(|| card.clone());
        }
        self.cards.insert(card_key(&card.name), card);
    }

    pub fn get(&self, name: &str) -> Option<&CardInfo> {
        self.cards
            .get(&card_key(name))
            .or_else(|| front_face(name).and_then(|front| self.cards.get(&card_key(front))))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<CardInfo> for CardCatalog {
    fn from_iter<I: IntoIterator<Item = CardInfo>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for card in iter {
            catalog.insert(card);
        }
        catalog
    }
}

fn front_face(name: &str) -> Option<&str> {
    name.split_once("//").map(|(front, _)| front.trim())
}
