mod matrix;

pub use matrix::{MatchupCell, MatchupMatrix, MatchupMatrixBuilder};
