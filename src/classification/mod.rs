pub mod catalog;
pub mod colors;
pub mod engine;

pub use catalog::{CardCatalog, CardInfo};
pub use colors::{ColorIdentifier, ColorSet};
pub use engine::{Classification, ClassificationEngine, ClassifiedDeck, Resolution, classify};
