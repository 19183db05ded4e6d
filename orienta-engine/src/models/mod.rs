pub mod decision_tree;
pub mod kmeans;
pub mod label_encoder;
pub mod random_forest;
pub mod tree;

use std::collections::HashMap;

/// Classifieur ajusté sur des lignes de features numériques.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn n_classes(&self) -> usize;
    /// Retourne Vec<f64> de taille n_classes(), somme = 1.0
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;
    /// Importances normalisées, une par feature.
    fn feature_importances(&self) -> &[f64];
    fn params(&self) -> HashMap<String, f64>;

    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Indice du maximum, premier en cas d'égalité.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

pub fn validate_distribution(dist: &[f64], n_classes: usize) -> bool {
    if dist.len() != n_classes {
        return false;
    }
    if dist.iter().any(|&p| p < 0.0) {
        return false;
    }
    let sum: f64 = dist.iter().sum();
    (sum - 1.0).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn test_validate_distribution_valid() {
        assert!(validate_distribution(&[0.25; 4], 4));
    }

    #[test]
    fn test_validate_distribution_wrong_size() {
        assert!(!validate_distribution(&[0.5, 0.5], 3));
    }

    #[test]
    fn test_validate_distribution_negative() {
        assert!(!validate_distribution(&[1.1, -0.1], 2));
    }
}
