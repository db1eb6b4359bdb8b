use serde::{Deserialize, Serialize};

use crate::domain::{Deck, Zone};

/// Cards that must all be present, each at least `min_count` times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRequirement {
    #[serde(alias = "Cards")]
    pub cards: Vec<String>,
    #[serde(default, alias = "minCount", alias = "MinCount")]
    pub min_count: Option<u32>,
}

impl CardRequirement {
    pub fn required_copies(&self) -> u32 {
        self.min_count.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSet {
    #[serde(alias = "Cards")]
    pub cards: Vec<String>,
}

/// Deck zone(s) a condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Mainboard,
    Sideboard,
    Either,
}

impl Scope {
    fn quantity(self, deck: &Deck, name: &str) -> u32 {
        match self {
            Scope::Mainboard => deck.quantity(name, Zone::Mainboard),
            Scope::Sideboard => deck.quantity(name, Zone::Sideboard),
            Scope::Either => {
                deck.quantity(name, Zone::Mainboard)
                    .saturating_add(deck.quantity(name, Zone::Sideboard))
            }
        }
    }
}

/// One predicate of an archetype definition; a rule file names the kind in `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    InMainboard(CardRequirement),
    InSideboard(CardRequirement),
    InMainOrSideboard(CardRequirement),
    OneOrMoreInMainboard(CardSet),
    OneOrMoreInSideboard(CardSet),
    OneOrMoreInMainOrSideboard(CardSet),
    TwoOrMoreInMainboard(CardSet),
    TwoOrMoreInSideboard(CardSet),
    TwoOrMoreInMainOrSideboard(CardSet),
    DoesNotContain(CardSet),
    DoesNotContainMainboard(CardSet),
    DoesNotContainSideboard(CardSet),
}

impl Condition {
    pub fn holds(&self, deck: &Deck) -> bool {
        match self {
            Condition::InMainboard(req) => all_present(deck, req, Scope::Mainboard),
            Condition::InSideboard(req) => all_present(deck, req, Scope::Sideboard),
            Condition::InMainOrSideboard(req) => all_present(deck, req, Scope::Either),
            Condition::OneOrMoreInMainboard(set) => distinct_present(deck, set, Scope::Mainboard) >= 1,
            Condition::OneOrMoreInSideboard(set) => distinct_present(deck, set, Scope::Sideboard) >= 1,
            Condition::OneOrMoreInMainOrSideboard(set) => {
                distinct_present(deck, set, Scope::Either) >= 1
            }
            Condition::TwoOrMoreInMainboard(set) => distinct_present(deck, set, Scope::Mainboard) >= 2,
            Condition::TwoOrMoreInSideboard(set) => distinct_present(deck, set, Scope::Sideboard) >= 2,
            Condition::TwoOrMoreInMainOrSideboard(set) => {
                distinct_present(deck, set, Scope::Either) >= 2
            }
            Condition::DoesNotContain(set) => distinct_present(deck, set, Scope::Either) == 0,
            Condition::DoesNotContainMainboard(set) => {
                distinct_present(deck, set, Scope::Mainboard) == 0
            }
            Condition::DoesNotContainSideboard(set) => {
                distinct_present(deck, set, Scope::Sideboard) == 0
            }
        }
    }

    pub fn cards(&self) -> &[String] {
        match self {
            Condition::InMainboard(req)
            | Condition::InSideboard(req)
            | Condition::InMainOrSideboard(req) => &req.cards,
            Condition::OneOrMoreInMainboard(set)
            | Condition::OneOrMoreInSideboard(set)
            | Condition::OneOrMoreInMainOrSideboard(set)
            | Condition::TwoOrMoreInMainboard(set)
            | Condition::TwoOrMoreInSideboard(set)
            | Condition::TwoOrMoreInMainOrSideboard(set)
            | Condition::DoesNotContain(set)
            | Condition::DoesNotContainMainboard(set)
            | Condition::DoesNotContainSideboard(set) => &set.cards,
        }
    }

    /// How many named cards a deck must hold for this condition to pass
    pub fn required_cards(&self) -> usize {
        match self {
            Condition::InMainboard(req)
            | Condition::InSideboard(req)
            | Condition::InMainOrSideboard(req) => req.cards.len(),
            Condition::OneOrMoreInMainboard(_)
            | Condition::OneOrMoreInSideboard(_)
            | Condition::OneOrMoreInMainOrSideboard(_) => 1,
            Condition::TwoOrMoreInMainboard(_)
            | Condition::TwoOrMoreInSideboard(_)
            | Condition::TwoOrMoreInMainOrSideboard(_) => 2,
            Condition::DoesNotContain(_)
            | Condition::DoesNotContainMainboard(_)
            | Condition::DoesNotContainSideboard(_) => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Condition::InMainboard(_) => "InMainboard",
            Condition::InSideboard(_) => "InSideboard",
            Condition::InMainOrSideboard(_) => "InMainOrSideboard",
            Condition::OneOrMoreInMainboard(_) => "OneOrMoreInMainboard",
            Condition::OneOrMoreInSideboard(_) => "OneOrMoreInSideboard",
            Condition::OneOrMoreInMainOrSideboard(_) => "OneOrMoreInMainOrSideboard",
            Condition::TwoOrMoreInMainboard(_) => "TwoOrMoreInMainboard",
            Condition::TwoOrMoreInSideboard(_) => "TwoOrMoreInSideboard",
            Condition::TwoOrMoreInMainOrSideboard(_) => "TwoOrMoreInMainOrSideboard",
            Condition::DoesNotContain(_) => "DoesNotContain",
            Condition::DoesNotContainMainboard(_) => "DoesNotContainMainboard",
            Condition::DoesNotContainSideboard(_) => "DoesNotContainSideboard",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let cards = self.cards();
        if cards.is_empty() {
            return Err(format!("{} condition without cards", self.kind()));
        }
        if cards.iter().any(|c| c.trim().is_empty()) {
            return Err(format!("{} condition with a blank card name", self.kind()));
        }
        if self.required_cards() == 2 && cards.len() < 2 {
            return Err(format!("{} condition needs at least two cards", self.kind()));
        }

        match self {
            Condition::InMainboard(req)
            | Condition::InSideboard(req)
            | Condition::InMainOrSideboard(req)
                if req.min_count == Some(0) =>
            {
                Err(format!("{} condition with min_count 0", self.kind()))
            }
            _ => Ok(()),
        }
    }
}

fn all_present(deck: &Deck, req: &CardRequirement, scope: Scope) -> bool {
    let copies = req.required_copies();
    req.cards
        .iter()
        .all(|card| scope.quantity(deck, card) >= copies)
}

fn distinct_present(deck: &Deck, set: &CardSet, scope: Scope) -> usize {
    set.cards
        .iter()
        .filter(|card| scope.quantity(deck, card) > 0)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Card, Record};

    fn deck(main: &[(&str, u32)], side: &[(&str, u32)]) -> Deck {
        Deck {
            tournament_id: "t".to_string(),
            player: "p".to_string(),
            record: Record::default(),
            mainboard: main
                .iter()
                .map(|(n, q)| Card::new(n, *q, Zone::Mainboard))
                .collect(),
            sideboard: side
                .iter()
                .map(|(n, q)| Card::new(n, *q, Zone::Sideboard))
                .collect(),
        }
    }

    fn set(cards: &[&str]) -> CardSet {
        CardSet {
            cards: cards.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn requirement(cards: &[&str], min_count: Option<u32>) -> CardRequirement {
        CardRequirement {
            cards: cards.iter().map(|c| c.to_string()).collect(),
            min_count,
        }
    }

    #[test]
    fn test_in_mainboard_respects_min_count() {
        let deck = deck(&[("Lightning Bolt", 3), ("Goblin Guide", 4)], &[]);

        assert!(Condition::InMainboard(requirement(&["Lightning Bolt", "Goblin Guide"], None)).holds(&deck));
        assert!(!Condition::InMainboard(requirement(&["Lightning Bolt"], Some(4))).holds(&deck));
        assert!(Condition::InMainboard(requirement(&["Goblin Guide"], Some(4))).holds(&deck));
    }

    #[test]
    fn test_in_main_or_sideboard_sums_zones() {
        let deck = deck(&[("Blood Moon", 2)], &[("Blood Moon", 1)]);

        assert!(Condition::InMainOrSideboard(requirement(&["Blood Moon"], Some(3))).holds(&deck));
        assert!(!Condition::InMainboard(requirement(&["Blood Moon"], Some(3))).holds(&deck));
        assert!(Condition::InSideboard(requirement(&["Blood Moon"], None)).holds(&deck));
    }

    #[test]
    fn test_one_and_two_or_more_count_distinct_cards() {
        let deck = deck(&[("Ragavan, Nimble Pilferer", 4)], &[("Murktide Regent", 2)]);
        let pair = set(&["Ragavan, Nimble Pilferer", "Murktide Regent"]);

        assert!(Condition::OneOrMoreInMainboard(pair.clone()).holds(&deck));
        assert!(!Condition::TwoOrMoreInMainboard(pair.clone()).holds(&deck));
        assert!(Condition::TwoOrMoreInMainOrSideboard(pair.clone()).holds(&deck));
        assert!(Condition::OneOrMoreInSideboard(pair).holds(&deck));
    }

    #[test]
    fn test_does_not_contain_checks_zones() {
        let deck = deck(&[("Island", 10)], &[("Mystical Dispute", 2)]);
        let dispute = set(&["Mystical Dispute"]);

        assert!(!Condition::DoesNotContain(dispute.clone()).holds(&deck));
        assert!(Condition::DoesNotContainMainboard(dispute.clone()).holds(&deck));
        assert!(!Condition::DoesNotContainSideboard(dispute).holds(&deck));
    }

    #[test]
    fn test_deserialize_tagged_condition() {
        let json = r#"{"type": "InMainboard", "cards": ["Lightning Bolt"], "minCount": 4}"#;
        let condition: Condition = serde_json::from_str(json).unwrap();

        assert_eq!(
            condition,
            Condition::InMainboard(requirement(&["Lightning Bolt"], Some(4)))
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"type": "ThreeOrMoreInMainboard", "cards": ["Island"]}"#;
        assert!(serde_json::from_str::<Condition>(json).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Condition::TwoOrMoreInMainboard(set(&["Island"])).validate().is_err());
        assert!(Condition::DoesNotContain(set(&[])).validate().is_err());
        assert!(Condition::InMainboard(requirement(&["Island"], Some(0))).validate().is_err());
        assert!(Condition::InMainboard(requirement(&["Island"], Some(4))).validate().is_ok());
    }

    #[test]
    fn test_required_cards() {
        assert_eq!(Condition::InMainboard(requirement(&["A", "B", "C"], None)).required_cards(), 3);
        assert_eq!(Condition::OneOrMoreInMainboard(set(&["A", "B", "C"])).required_cards(), 1);
        assert_eq!(Condition::TwoOrMoreInSideboard(set(&["A", "B"])).required_cards(), 2);
        assert_eq!(Condition::DoesNotContain(set(&["A"])).required_cards(), 0);
    }
}
