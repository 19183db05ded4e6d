use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::Classifier;
use super::tree::{build_tree, MaxFeatures, Tree, TreeParams};
use crate::error::{Error, Result};

/// Arbre de classification unique, classes pondérées (« balanced »).
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    tree: Tree,
    n_classes: usize,
    max_depth: Option<usize>,
    seed: u64,
}

impl DecisionTreeClassifier {
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        max_depth: Option<usize>,
        seed: u64,
    ) -> Result<Self> {
        check_training_set(features, labels, n_classes)?;

        let class_weights = balanced_class_weights(labels, n_classes);
        let weights: Vec<f64> = labels.iter().map(|&c| class_weights[c]).collect();

        let params = TreeParams { max_depth, max_features: MaxFeatures::All };
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = build_tree(features, labels, &weights, n_classes, &params, &mut rng);

        Ok(Self { tree, n_classes, max_depth, seed })
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &str {
        "DecisionTree"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        self.tree.predict_proba(features).to_vec()
    }

    fn feature_importances(&self) -> &[f64] {
        self.tree.importances()
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("max_depth".to_string(), self.max_depth.map_or(f64::INFINITY, |d| d as f64)),
            ("depth".to_string(), self.tree.depth() as f64),
            ("seed".to_string(), self.seed as f64),
        ])
    }
}

/// w_c = n / (k · n_c), k = nombre de classes présentes. Classe absente → 0.
pub fn balanced_class_weights(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &c in labels {
        counts[c] += 1;
    }
    let present = counts.iter().filter(|&&c| c > 0).count().max(1);
    let n = labels.len() as f64;

    counts
        .iter()
        .map(|&c| if c == 0 { 0.0 } else { n / (present as f64 * c as f64) })
        .collect()
}

pub(crate) fn check_training_set(features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<()> {
    if features.is_empty() {
        return Err(Error::ModelInit("jeu d'entraînement vide".to_string()));
    }
    if features.len() != labels.len() {
        return Err(Error::ModelInit(format!(
            "{} lignes de features pour {} étiquettes",
            features.len(),
            labels.len()
        )));
    }
    let width = features[0].len();
    if width == 0 || features.iter().any(|row| row.len() != width) {
        return Err(Error::ModelInit("lignes de features de largeurs différentes".to_string()));
    }
    if let Some(&bad) = labels.iter().find(|&&c| c >= n_classes) {
        return Err(Error::ModelInit(format!("classe {} hors de 0..{}", bad, n_classes)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate_distribution;

    #[test]
    fn test_balanced_weights() {
        let weights = balanced_class_weights(&[0, 0, 0, 1], 3);
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);
        assert_eq!(weights[2], 0.0);
    }

    #[test]
    fn test_fit_predict_separable() {
        let features: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64, (i % 2) as f64]).collect();
        let labels: Vec<usize> = (0..12).map(|i| i / 4).collect();
        let model = DecisionTreeClassifier::fit(&features, &labels, 3, Some(8), 42).unwrap();

        for (row, &label) in features.iter().zip(&labels) {
            assert_eq!(model.predict(row), label);
            assert!(validate_distribution(&model.predict_proba(row), 3));
        }
        let total: f64 = model.feature_importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_minority_class_is_learned() {
        // Une seule ligne de classe 1 parmi 20 : la pondération la rend séparable
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let mut labels = vec![0; 20];
        labels[19] = 1;
        let model = DecisionTreeClassifier::fit(&features, &labels, 2, Some(8), 42).unwrap();
        assert_eq!(model.predict(&[19.0]), 1);
        assert_eq!(model.predict(&[3.0]), 0);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![(i * 7 % 11) as f64, (i * 3 % 5) as f64]).collect();
        let labels: Vec<usize> = (0..30).map(|i| i % 3).collect();
        let a = DecisionTreeClassifier::fit(&features, &labels, 3, Some(4), 42).unwrap();
        let b = DecisionTreeClassifier::fit(&features, &labels, 3, Some(4), 42).unwrap();
        for row in &features {
            assert_eq!(a.predict_proba(row), b.predict_proba(row));
        }
    }

    #[test]
    fn test_invalid_training_set() {
        assert!(DecisionTreeClassifier::fit(&[], &[], 2, None, 0).is_err());
        assert!(DecisionTreeClassifier::fit(&[vec![1.0]], &[5], 2, None, 0).is_err());
        assert!(DecisionTreeClassifier::fit(&[vec![1.0], vec![1.0, 2.0]], &[0, 1], 2, None, 0).is_err());
    }
}
