use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::warn;

use super::models::{Card, CardEntry, Deck, DeckRecord, Tournament, TournamentRecord, Zone};
use crate::errors::{MetagameError, MetagameResult};

/// Lookup key for card names: trimmed and lower-cased
pub fn card_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn parse_date_string(date_str: &str) -> MetagameResult<NaiveDate> {
    let date_str = date_str.trim();

    // Try RFC3339 format (with timezone)
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.naive_utc().date());
    }

    // Try naive datetime format (without timezone)
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }

    // Try with fractional seconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }

    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    Err(MetagameError::invalid_record(
        "date",
        format!("Failed to parse date: {}", date_str),
    ))
}

impl TournamentRecord {
    /// Normalise into a domain tournament, dropping decks that fail validation
    pub fn into_tournament(self) -> MetagameResult<Tournament> {
        let context = format!("tournament {}", self.id);
        let date = parse_date_string(&self.date)
            .map_err(|e| MetagameError::invalid_record(context.clone(), e))?;

        let format = self.format.trim().to_lowercase();
        if format.is_empty() {
            return Err(MetagameError::invalid_record(context, "missing format"));
        }

        let decks = self
            .decks
            .into_iter()
            .filter_map(|deck| match normalize_deck(&self.id, deck) {
                Ok(deck) => Some(deck),
                Err(e) => {
                    warn!("Skipping deck in {}: {}", context, e);
                    None
                }
            })
            .collect();

        Ok(Tournament {
            id: self.id,
            name: self.name,
            date,
            format,
            source: self.source,
            decks,
        })
    }
}

fn normalize_deck(tournament_id: &str, deck: DeckRecord) -> MetagameResult<Deck> {
    let player = deck.player.trim().to_string();
    if player.is_empty() {
        return Err(MetagameError::invalid_record(
            format!("tournament {}", tournament_id),
            "deck without player",
        ));
    }

    let context = format!("deck of {} in tournament {}", player, tournament_id);
    let mainboard = merge_cards(&deck.mainboard, Zone::Mainboard, &context)?;
    let sideboard = merge_cards(&deck.sideboard, Zone::Sideboard, &context)?;

    Ok(Deck {
        tournament_id: tournament_id.to_string(),
        player,
        record: deck.record,
        mainboard,
        sideboard,
    })
}

/// Validate quantities and fold repeated entries of the same card
fn merge_cards(entries: &[CardEntry], zone: Zone, context: &str) -> MetagameResult<Vec<Card>> {
    let mut cards: Vec<Card> = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(MetagameError::invalid_record(context, "card without name"));
        }
        let quantity = u32::try_from(entry.count)
            .ok()
            .filter(|&q| q > 0)
            .ok_or_else(|| {
                MetagameError::invalid_record(
                    context,
                    format!("non-positive quantity {} for {}", entry.count, name),
                )
            })?;

        let key = card_key(name);
        match cards.iter_mut().find(|c| card_key(&c.name) == key) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
                    MetagameError::invalid_record(
                        context,
                        format!("quantity of {} overflows", name),
                    )
                })?;
            }
            None => cards.push(Card::new(name, quantity, zone)),
        }
    }

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    fn entry(name: &str, count: i64) -> CardEntry {
        CardEntry {
            name: name.to_string(),
            count,
        }
    }

    fn record_with(decks: Vec<DeckRecord>) -> TournamentRecord {
        TournamentRecord {
            id: "t1".to_string(),
            name: "Modern Challenge".to_string(),
            date: "2024-05-04T15:00:00Z".to_string(),
            format: " Modern ".to_string(),
            source: "mtgo".to_string(),
            decks,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();

        assert_eq!(parse_date_string("2024-05-04").unwrap(), expected);
        assert_eq!(parse_date_string("2024-05-04T10:00:00").unwrap(), expected);
        assert_eq!(parse_date_string("2024-05-04T10:00:00.250").unwrap(), expected);
        assert_eq!(parse_date_string("2024-05-04T10:00:00+00:00").unwrap(), expected);
        assert!(parse_date_string("May 4th").is_err());
    }

    #[test]
    fn test_into_tournament_merges_duplicate_cards() {
        let deck = DeckRecord {
            player: "alice".to_string(),
            record: Record::new(5, 2, 0),
            mainboard: vec![entry("Lightning Bolt", 2), entry("lightning bolt ", 2)],
            sideboard: vec![],
        };

        let tournament = record_with(vec![deck]).into_tournament().unwrap();

        assert_eq!(tournament.format, "modern");
        assert_eq!(tournament.decks.len(), 1);
        assert_eq!(tournament.decks[0].mainboard.len(), 1);
        assert_eq!(tournament.decks[0].mainboard[0].quantity, 4);
    }

    #[test]
    fn test_invalid_decks_are_dropped() {
        let no_player = DeckRecord {
            player: "  ".to_string(),
            record: Record::default(),
            mainboard: vec![entry("Island", 20)],
            sideboard: vec![],
        };
        let negative = DeckRecord {
            player: "bob".to_string(),
            record: Record::default(),
            mainboard: vec![entry("Island", -1)],
            sideboard: vec![],
        };
        let valid = DeckRecord {
            player: "carol".to_string(),
            record: Record::default(),
            mainboard: vec![entry("Island", 20)],
            sideboard: vec![],
        };

        let tournament = record_with(vec![no_player, negative, valid])
            .into_tournament()
            .unwrap();

        assert_eq!(tournament.decks.len(), 1);
        assert_eq!(tournament.decks[0].player, "carol");
    }

    #[test]
    fn test_overflowing_quantity_drops_deck() {
        let huge = DeckRecord {
            player: "dave".to_string(),
            record: Record::default(),
            mainboard: vec![
                entry("Island", u32::MAX as i64),
                entry("island", u32::MAX as i64),
            ],
            sideboard: vec![],
        };
        let valid = DeckRecord {
            player: "erin".to_string(),
            record: Record::default(),
            mainboard: vec![entry("Island", 20)],
            sideboard: vec![],
        };

        let tournament = record_with(vec![huge, valid]).into_tournament().unwrap();

        assert_eq!(tournament.decks.len(), 1);
        assert_eq!(tournament.decks[0].player, "erin");
    }

    #[test]
    fn test_bad_date_is_recoverable_error() {
        let mut record = record_with(vec![]);
        record.date = "yesterday".to_string();

        let err = record.into_tournament().unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("tournament t1"));
    }
}
