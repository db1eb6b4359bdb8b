use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::classification::ClassifiedDeck;
use crate::domain::{Deck, Zone, card_key};

/// SHA-256 of the sorted, case-folded decklist, zone by zone
pub fn decklist_hash(deck: &Deck) -> String {
    let mut hasher = Sha256::new();

    for zone in [Zone::Mainboard, Zone::Sideboard] {
        let mut lines: Vec<(String, u32)> = deck
            .cards(zone)
            .iter()
            .map(|c| (card_key(&c.name), c.quantity))
            .collect();
        lines.sort();

        hasher.update(zone_tag(zone));
        for (name, quantity) in lines {
            hasher.update(format!("{} {}\n", quantity, name));
        }
    }

    hex::encode(hasher.finalize())
}

fn zone_tag(zone: Zone) -> &'static [u8] {
    match zone {
        Zone::Mainboard => b"[main]\n",
        Zone::Sideboard => b"[side]\n",
    }
}

pub struct DedupOutcome<'a> {
    pub decks: Vec<&'a ClassifiedDeck>,
    pub removed: usize,
}

/// Drop repeated (tournament, player, decklist) entries, keeping the one with most matches played
pub fn deduplicate(decks: &[ClassifiedDeck]) -> DedupOutcome<'_> {
    let mut kept: Vec<&ClassifiedDeck> = Vec::with_capacity(decks.len());
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for classified in decks {
        let deck = &classified.deck;
        let key = (
            deck.tournament_id.clone(),
            card_key(&deck.player),
            decklist_hash(deck),
        );

        match index.get(&key) {
            Some(&slot) => {
                if is_more_complete(classified, kept[slot]) {
                    kept[slot] = classified;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(classified);
            }
        }
    }

    let removed = decks.len() - kept.len();
    DedupOutcome {
        decks: kept,
        removed,
    }
}

fn is_more_complete(candidate: &ClassifiedDeck, current: &ClassifiedDeck) -> bool {
    candidate.deck.record.matches_played() > current.deck.record.matches_played()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{ColorSet, Resolution};
    use crate::domain::{Card, Record};

    fn classified(tournament: &str, player: &str, main: &[(&str, u32)], record: Record) -> ClassifiedDeck {
        ClassifiedDeck {
            deck: Deck {
                tournament_id: tournament.to_string(),
                player: player.to_string(),
                record,
                mainboard: main
                    .iter()
                    .map(|(n, q)| Card::new(n, *q, Zone::Mainboard))
                    .collect(),
                sideboard: vec![],
            },
            archetype: "Burn".to_string(),
            color_identity: ColorSet::from_symbols("R"),
            resolution: Resolution::Primary,
            base_archetype: "Burn".to_string(),
        }
    }

    #[test]
    fn test_hash_ignores_order_and_case() {
        let a = classified("t", "p", &[("Lightning Bolt", 4), ("Goblin Guide", 4)], Record::default());
        let b = classified("t", "p", &[("goblin guide", 4), ("Lightning Bolt", 4)], Record::default());
        let c = classified("t", "p", &[("Lightning Bolt", 3), ("Goblin Guide", 4)], Record::default());

        assert_eq!(decklist_hash(&a.deck), decklist_hash(&b.deck));
        assert_ne!(decklist_hash(&a.deck), decklist_hash(&c.deck));
    }

    #[test]
    fn test_keeps_most_complete_record() {
        let decks = vec![
            classified("t1", "alice", &[("Lightning Bolt", 4)], Record::new(2, 1, 0)),
            classified("t1", "Alice", &[("Lightning Bolt", 4)], Record::new(4, 3, 1)),
            classified("t2", "alice", &[("Lightning Bolt", 4)], Record::new(1, 0, 0)),
        ];

        let outcome = deduplicate(&decks);

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.decks.len(), 2);
        assert_eq!(outcome.decks[0].deck.record, Record::new(4, 3, 1));
        assert_eq!(outcome.decks[1].deck.tournament_id, "t2");
    }

    #[test]
    fn test_different_lists_are_not_duplicates() {
        let decks = vec![
            classified("t1", "alice", &[("Lightning Bolt", 4)], Record::default()),
            classified("t1", "alice", &[("Lava Spike", 4)], Record::default()),
        ];

        assert_eq!(deduplicate(&decks).removed, 0);
    }
}
