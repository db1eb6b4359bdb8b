use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Serialize, Serializer};

use super::catalog::CardCatalog;
use crate::domain::Card;

static MANA_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("mana symbol pattern is valid"));

const WUBRG: [char; 5] = ['W', 'U', 'B', 'R', 'G'];

/// Guild, shard and wedge names keyed by WUBRG-ordered symbols
const COLOR_LABELS: [(&str, &str); 25] = [
    ("W", "White"),
    ("U", "Blue"),
    ("B", "Black"),
    ("R", "Red"),
    ("G", "Green"),
    ("WU", "Azorius"),
    ("UB", "Dimir"),
    ("BR", "Rakdos"),
    ("RG", "Gruul"),
    ("WG", "Selesnya"),
    ("WB", "Orzhov"),
    ("UR", "Izzet"),
    ("BG", "Golgari"),
    ("WR", "Boros"),
    ("UG", "Simic"),
    ("WUG", "Bant"),
    ("WUB", "Esper"),
    ("UBR", "Grixis"),
    ("BRG", "Jund"),
    ("WRG", "Naya"),
    ("WBG", "Abzan"),
    ("WUR", "Jeskai"),
    ("UBG", "Sultai"),
    ("WBR", "Mardu"),
    ("URG", "Temur"),
];

/// Set of WUBRG colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorSet(u8);

impl ColorSet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Parse the WUBRG letters of a string, ignoring everything else
    pub fn from_symbols(symbols: &str) -> Self {
        symbols.chars().fold(Self::empty(), |mut set, c| {
            set.insert(c);
            set
        })
    }

    pub fn insert(&mut self, color: char) {
        if let Some(bit) = bit_of(color) {
            self.0 |= bit;
        }
    }

    pub fn contains(&self, color: char) -> bool {
        bit_of(color).is_some_and(|bit| self.0 & bit != 0)
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Symbols in WUBRG order, e.g. "UR"
    pub fn symbols(&self) -> String {
        WUBRG.iter().filter(|&&c| self.contains(c)).collect()
    }

    pub fn label(&self) -> &'static str {
        match self.len() {
            0 => "Colorless",
            4 => "Four-Color",
            5 => "Five-Color",
            _ => {
                let symbols = self.symbols();
                COLOR_LABELS
                    .iter()
                    .find(|(key, _)| *key == symbols)
                    .map(|(_, label)| *label)
                    .unwrap_or("Colorless")
            }
        }
    }

    /// Archetype name with the color label in front; colorless decks keep the bare name
    pub fn decorate(&self, archetype: &str) -> String {
        if self.is_empty() {
            archetype.to_string()
        } else {
            format!("{} {}", self.label(), archetype)
        }
    }
}

fn bit_of(color: char) -> Option<u8> {
    WUBRG
        .iter()
        .position(|&c| c == color.to_ascii_uppercase())
        .map(|idx| 1 << idx)
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols())
    }
}

impl Serialize for ColorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbols())
    }
}

/// Colors of the mana symbols in a cost, e.g. "{1}{W/U}{R/P}" -> WUR
pub fn colors_of_cost(mana_cost: &str) -> ColorSet {
    MANA_SYMBOL
        .captures_iter(mana_cost)
        .filter_map(|caps| caps.get(1))
        .fold(ColorSet::empty(), |set, symbol| {
            set.union(ColorSet::from_symbols(symbol.as_str()))
        })
}

/// Derives a deck's colors from the non-land cards of its mainboard
#[derive(Debug, Clone, Copy)]
pub struct ColorIdentifier<'a> {
    catalog: &'a CardCatalog,
}

impl<'a> ColorIdentifier<'a> {
    pub fn new(catalog: &'a CardCatalog) -> Self {
        Self { catalog }
    }

    pub fn identify(&self, mainboard: &[Card]) -> ColorSet {
        mainboard
            .iter()
            .filter_map(|card| match self.catalog.get(&card.name) {
                Some(info) => Some(info),
                None => {
                    debug!("No catalog entry for {}", card.name);
                    None
                }
            })
            .filter(|info| !info.is_land())
            .fold(ColorSet::empty(), |set, info| {
                set.union(colors_of_cost(&info.mana_cost))
            })
    }
}
