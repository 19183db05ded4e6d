use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::prelude::*;
use rayon::prelude::*;

use super::Classifier;
use super::decision_tree::check_training_set;
use super::tree::{build_tree, MaxFeatures, Tree, TreeParams};
use crate::error::Result;

/// Forêt aléatoire : bootstrap par arbre, √features candidates par split, profondeur libre.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<Tree>,
    n_classes: usize,
    importances: Vec<f64>,
    seed: u64,
}

impl RandomForestClassifier {
    /// L'arbre `t` utilise la graine `seed + t`, l'ajustement parallèle reste reproductible.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        n_trees: usize,
        seed: u64,
    ) -> Result<Self> {
        check_training_set(features, labels, n_classes)?;

        let n_samples = features.len();
        let params = TreeParams { max_depth: None, max_features: MaxFeatures::Sqrt };

        let trees: Vec<Tree> = (0..n_trees.max(1))
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));

                // Bootstrap sampling, exprimé en nombre de tirages par ligne
                let mut counts = vec![0.0; n_samples];
                for _ in 0..n_samples {
                    counts[rng.random_range(0..n_samples)] += 1.0;
                }

                build_tree(features, labels, &counts, n_classes, &params, &mut rng)
            })
            .collect();

        let importances = forest_importances(&trees, features[0].len());
        log::debug!("Forêt ajustée: {} arbres, {} classes", trees.len(), n_classes);

        Ok(Self { trees, n_classes, importances, seed })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &str {
        "RandomForest"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, &v) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *p += v;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n;
        }
        proba
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("n_trees".to_string(), self.trees.len() as f64),
            ("max_depth".to_string(), f64::INFINITY),
            ("seed".to_string(), self.seed as f64),
        ])
    }
}

/// Moyenne des importances des arbres non réduits à une feuille, renormalisée.
fn forest_importances(trees: &[Tree], n_features: usize) -> Vec<f64> {
    let mut importances = vec![0.0; n_features];
    let mut counted = 0;
    for tree in trees {
        let imp = tree.importances();
        if imp.iter().sum::<f64>() <= 0.0 {
            continue;
        }
        counted += 1;
        for (acc, &v) in importances.iter_mut().zip(imp) {
            *acc += v;
        }
    }
    if counted == 0 {
        return importances;
    }

    let total: f64 = importances.iter().sum();
    for imp in &mut importances {
        *imp /= total;
    }
    importances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate_distribution;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        // Classe déterminée par la première feature, la seconde est du bruit
        let features: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![(i % 3) as f64 * 10.0 + (i % 7) as f64 * 0.1, (i * 13 % 17) as f64])
            .collect();
        let labels: Vec<usize> = (0..60).map(|i| i % 3).collect();
        (features, labels)
    }

    #[test]
    fn test_random_forest_sums_to_one() {
        let (features, labels) = toy_data();
        let model = RandomForestClassifier::fit(&features, &labels, 3, 20, 42).unwrap();
        for row in &features {
            let dist = model.predict_proba(row);
            assert!(validate_distribution(&dist, 3), "Sum = {}", dist.iter().sum::<f64>());
        }
    }

    #[test]
    fn test_random_forest_learns_signal() {
        let (features, labels) = toy_data();
        let model = RandomForestClassifier::fit(&features, &labels, 3, 30, 42).unwrap();
        for (row, &label) in features.iter().zip(&labels).take(6) {
            assert_eq!(model.predict(row), label);
        }

        let imp = model.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1], "importances: {:?}", imp);
    }

    #[test]
    fn test_random_forest_reproducible() {
        let (features, labels) = toy_data();
        let a = RandomForestClassifier::fit(&features, &labels, 3, 10, 7).unwrap();
        let b = RandomForestClassifier::fit(&features, &labels, 3, 10, 7).unwrap();
        assert_eq!(a.predict_proba(&[4.0, 4.0]), b.predict_proba(&[4.0, 4.0]));
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_random_forest_empty_training_set() {
        assert!(RandomForestClassifier::fit(&[], &[], 3, 10, 42).is_err());
    }
}
