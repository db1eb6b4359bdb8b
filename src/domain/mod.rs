mod collection;
pub mod models;
pub mod normalize;
mod progress;

pub use collection::TournamentCollection;
pub use models::*;
pub use normalize::{card_key, parse_date_string};
pub use progress::LoadProgress;
