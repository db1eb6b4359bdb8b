use log::warn;
use rayon::prelude::*;
use serde::Serialize;

use super::catalog::CardCatalog;
use super::colors::{ColorIdentifier, ColorSet};
use crate::config::ClassificationSettings;
use crate::domain::Deck;
use crate::errors::ClassificationAmbiguity;
use crate::rules::{ArchetypeDefinition, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Primary,
    Fallback,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Display name, color label included when the definition asks for it
    pub archetype: String,
    pub base_archetype: String,
    pub color_identity: ColorSet,
    pub color_label: &'static str,
    pub resolution: Resolution,
    pub ambiguity: Option<ClassificationAmbiguity>,
}

/// A deck with its archetype assigned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedDeck {
    #[serde(flatten)]
    pub deck: Deck,
    pub archetype: String,
    pub color_identity: ColorSet,
    pub resolution: Resolution,
    #[serde(skip)]
    pub base_archetype: String,
}

impl ClassifiedDeck {
    pub fn new(deck: Deck, classification: Classification) -> Self {
        Self {
            deck,
            archetype: classification.archetype,
            color_identity: classification.color_identity,
            resolution: classification.resolution,
            base_archetype: classification.base_archetype,
        }
    }
}

/// Assigns exactly one archetype per deck. Pure: same deck and rules, same answer.
pub struct ClassificationEngine<'a> {
    rules: &'a RuleSet,
    colors: ColorIdentifier<'a>,
    unclassified_label: String,
}

impl<'a> ClassificationEngine<'a> {
    pub fn new(
        rules: &'a RuleSet,
        catalog: &'a CardCatalog,
        settings: &ClassificationSettings,
    ) -> Self {
        Self {
            rules,
            colors: ColorIdentifier::new(catalog),
            unclassified_label: settings.unclassified_label.clone(),
        }
    }

    pub fn classify(&self, deck: &Deck) -> Classification {
        let color_identity = self.colors.identify(&deck.mainboard);

        let primary = resolve(self.rules.primary(), deck);
        let (resolved, resolution) = match primary {
            Some(found) => (Some(found), Resolution::Primary),
            None => match resolve(self.rules.fallback(), deck) {
                Some(found) => (Some(found), Resolution::Fallback),
                None => (None, Resolution::Unclassified),
            },
        };

        let Some((definition, tied)) = resolved else {
            return Classification {
                archetype: self.unclassified_label.clone(),
                base_archetype: self.unclassified_label.clone(),
                color_label: color_identity.label(),
                color_identity,
                resolution,
                ambiguity: None,
            };
        };

        let ambiguity = build_ambiguity(deck, definition, &tied);
        if let Some(ambiguity) = &ambiguity {
            warn!(
                "Ambiguous classification for {} in {}: {:?} matched equally, chose {}",
                ambiguity.player, ambiguity.tournament_id, ambiguity.candidates, ambiguity.chosen
            );
        }

        let archetype = if definition.include_color_in_name {
            color_identity.decorate(&definition.name)
        } else {
            definition.name.clone()
        };

        Classification {
            archetype,
            base_archetype: definition.base_name().to_string(),
            color_label: color_identity.label(),
            color_identity,
            resolution,
            ambiguity,
        }
    }

    /// Classify a batch in parallel; output order follows input order
    pub fn classify_all(
        &self,
        decks: Vec<Deck>,
    ) -> (Vec<ClassifiedDeck>, Vec<ClassificationAmbiguity>) {
        let results: Vec<(ClassifiedDeck, Option<ClassificationAmbiguity>)> = decks
            .into_par_iter()
            .map(|deck| {
                let mut classification = self.classify(&deck);
                let ambiguity = classification.ambiguity.take();
                (ClassifiedDeck::new(deck, classification), ambiguity)
            })
            .collect();

        let mut ambiguities = Vec::new();
        let classified = results
            .into_iter()
            .map(|(deck, ambiguity)| {
                ambiguities.extend(ambiguity);
                deck
            })
            .collect();

        (classified, ambiguities)
    }
}

/// Best matching definition plus every other match of equal specificity
fn resolve<'d>(
    definitions: &'d [ArchetypeDefinition],
    deck: &Deck,
) -> Option<(&'d ArchetypeDefinition, Vec<&'d ArchetypeDefinition>)> {
    let mut matched: Vec<&ArchetypeDefinition> =
        definitions.iter().filter(|d| d.matches(deck)).collect();
    if matched.is_empty() {
        return None;
    }

    matched.sort_by(|a, b| a.resolution_order(b));
    let best = matched[0];
    let tied = matched[1..]
        .iter()
        .copied()
        .filter(|d| d.specificity() == best.specificity())
        .collect();

    Some((best, tied))
}

fn build_ambiguity(
    deck: &Deck,
    chosen: &ArchetypeDefinition,
    tied: &[&ArchetypeDefinition],
) -> Option<ClassificationAmbiguity> {
    // A variant outranks its own parent, which is not a real conflict
    let rivals: Vec<&ArchetypeDefinition> = tied
        .iter()
        .copied()
        .filter(|d| d.base_name() != chosen.base_name())
        .collect();
    if rivals.is_empty() {
        return None;
    }

    let mut candidates = vec![chosen.name.clone()];
    candidates.extend(rivals.iter().map(|d| d.name.clone()));

    Some(ClassificationAmbiguity {
        tournament_id: deck.tournament_id.clone(),
        player: deck.player.clone(),
        chosen: chosen.name.clone(),
        candidates,
    })
}

/// Archetype name and color identity of a deck under a rule set
pub fn classify(deck: &Deck, definitions: &RuleSet, catalog: &CardCatalog) -> (String, ColorSet) {
    let settings = ClassificationSettings::default();
    let engine = ClassificationEngine::new(definitions, catalog, &settings);
    let classification = engine.classify(deck);
    (classification.archetype, classification.color_identity)
}
