use serde::Serialize;

/// Diversity of a metagame from the archetype shares
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DiversityIndex {
    pub archetypes: usize,
    /// −Σ p·ln p
    pub shannon: f64,
    /// 1 − Σ p²
    pub simpson: f64,
    /// e^H
    pub effective_archetypes: f64,
    /// Σ p²
    pub herfindahl: f64,
    /// H / ln n
    pub evenness: f64,
}

/// All zeros for an empty share list; evenness is 0 with fewer than two archetypes
pub fn diversity(shares: &[f64]) -> DiversityIndex {
    let shares: Vec<f64> = shares.iter().copied().filter(|&p| p > 0.0).collect();
    if shares.is_empty() {
        return DiversityIndex::default();
    }

    let shannon = -shares.iter().map(|&p| p * p.ln()).sum::<f64>();
    let herfindahl = shares.iter().map(|&p| p * p).sum::<f64>();
    let n = shares.len();
    let evenness = if n > 1 { shannon / (n as f64).ln() } else { 0.0 };

    DiversityIndex {
        archetypes: n,
        shannon,
        simpson: 1.0 - herfindahl,
        effective_archetypes: shannon.exp(),
        herfindahl,
        evenness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_shares() {
        let index = diversity(&[0.25; 4]);

        assert!((index.shannon - 4f64.ln()).abs() < 1e-12);
        assert!((index.effective_archetypes - 4.0).abs() < 1e-9);
        assert!((index.simpson - 0.75).abs() < 1e-12);
        assert!((index.herfindahl - 0.25).abs() < 1e-12);
        assert!((index.evenness - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_archetype() {
        let index = diversity(&[1.0]);

        assert_eq!(index.shannon, 0.0);
        assert_eq!(index.simpson, 0.0);
        assert_eq!(index.effective_archetypes, 1.0);
        assert_eq!(index.evenness, 0.0);
    }

    #[test]
    fn test_empty_is_neutral() {
        assert_eq!(diversity(&[]), DiversityIndex::default());
    }

    #[test]
    fn test_skewed_shares() {
        let index = diversity(&[0.5, 0.3, 0.2]);
        let expected = -(0.5f64 * 0.5f64.ln() + 0.3 * 0.3f64.ln() + 0.2 * 0.2f64.ln());

        assert!((index.shannon - expected).abs() < 1e-12);
        assert!((index.herfindahl - 0.38).abs() < 1e-12);
        assert!(index.evenness < 1.0);
    }
}
