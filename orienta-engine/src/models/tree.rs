use std::cmp::Ordering;

use rand::prelude::*;
use rand::rngs::StdRng;

/// Écart minimal entre deux valeurs pour qu'un seuil les sépare.
const FEATURE_THRESHOLD: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf { distribution: Vec<f64> },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Arbre CART ajusté (critère de Gini pondéré).
#[derive(Debug, Clone)]
pub struct Tree {
    root: TreeNode,
    importances: Vec<f64>,
    depth: usize,
}

impl Tree {
    /// Distribution de classes de la feuille atteinte, somme = 1.0.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split { feature_idx, threshold, left, right } => {
                    node = if features[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Diminution d'impureté par feature, normalisée (somme 1.0, ou 0.0 pour un arbre réduit à une feuille).
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    children_impurity: f64,
}

struct Builder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: &'a TreeParams,
    n_features: usize,
    importances: Vec<f64>,
    depth: usize,
}

/// Construit un arbre sur les lignes de poids > 0. Les poids portent à la fois
/// la pondération des classes et les répétitions d'un échantillon bootstrap.
pub fn build_tree(
    features: &[Vec<f64>],
    labels: &[usize],
    weights: &[f64],
    n_classes: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Tree {
    let n_features = features.first().map_or(0, |f| f.len());
    let mut builder = Builder {
        features,
        labels,
        weights,
        n_classes,
        params,
        n_features,
        importances: vec![0.0; n_features],
        depth: 0,
    };

    let indices: Vec<usize> = (0..labels.len()).filter(|&i| weights[i] > 0.0).collect();
    let root = builder.grow(indices, 0, rng);

    let mut importances = builder.importances;
    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        for imp in &mut importances {
            *imp /= total;
        }
    }

    Tree { root, importances, depth: builder.depth }
}

impl Builder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> TreeNode {
        self.depth = self.depth.max(depth);

        let counts = self.class_counts(&indices);
        let node_weight: f64 = counts.iter().sum();
        let impurity = weighted_gini(&counts, node_weight);

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < 2 || impurity <= 1e-12 {
            return leaf(counts, node_weight);
        }

        let Some(split) = self.best_split(&indices, &counts, rng) else {
            return leaf(counts, node_weight);
        };

        let features = self.features;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| features[i][split.feature] <= split.threshold);

        if left.is_empty() || right.is_empty() {
            return leaf(counts, node_weight);
        }

        self.importances[split.feature] += impurity - split.children_impurity;

        TreeNode::Split {
            feature_idx: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(left, depth + 1, rng)),
            right: Box::new(self.grow(right, depth + 1, rng)),
        }
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += self.weights[i];
        }
        counts
    }

    /// Meilleur seuil parmi `max_features` features non constantes tirées dans un ordre aléatoire.
    /// Si les premières sont constantes, la recherche continue sur les suivantes.
    fn best_split(&self, indices: &[usize], counts: &[f64], rng: &mut StdRng) -> Option<Split> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(rng);
        let max_features = self.params.max_features.resolve(self.n_features);

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(indices.len());

        for &feature in &order {
            if visited >= max_features {
                break;
            }

            sorted.clear();
            sorted.extend(indices.iter().map(|&i| (self.features[i][feature], i)));
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            if sorted[sorted.len() - 1].0 <= sorted[0].0 + FEATURE_THRESHOLD {
                continue;
            }
            visited += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut right = counts.to_vec();
            let mut left_w = 0.0;
            let mut right_w: f64 = counts.iter().sum();

            for p in 0..sorted.len() - 1 {
                let (value, i) = sorted[p];
                let w = self.weights[i];
                left[self.labels[i]] += w;
                right[self.labels[i]] -= w;
                left_w += w;
                right_w -= w;

                let next = sorted[p + 1].0;
                if next <= value + FEATURE_THRESHOLD {
                    continue;
                }

                let score = weighted_gini(&left, left_w) + weighted_gini(&right, right_w);
                if best.as_ref().map_or(true, |b| score < b.children_impurity) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split { feature, threshold, children_impurity: score });
                }
            }
        }

        best
    }
}

fn leaf(counts: Vec<f64>, node_weight: f64) -> TreeNode {
    let n = counts.len();
    let distribution = if node_weight > 0.0 {
        counts.into_iter().map(|c| c / node_weight).collect()
    } else {
        vec![1.0 / n as f64; n]
    };
    TreeNode::Leaf { distribution }
}

/// Impureté de Gini multipliée par le poids du nœud : W - Σ w_c² / W.
fn weighted_gini(counts: &[f64], weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|c| c * c).sum();
    (weight - sum_sq / weight).max(0.0)
}
