use ndarray::{Array2, ArrayView1, Axis};
use rand::SeedableRng;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct KMeansParams {
    pub n_init: usize,
    pub max_iter: usize,
    /// Tolérance relative à la variance moyenne des colonnes.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self { n_init: 10, max_iter: 300, tol: 1e-4, seed: 42 }
    }
}

/// K-means (initialisation k-means++, itérations de Lloyd). Le meilleur des
/// `n_init` essais, au sens de l'inertie, est conservé.
#[derive(Debug, Clone)]
pub struct KMeans {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

impl KMeans {
    pub fn fit(data: &Array2<f64>, k: usize, params: &KMeansParams) -> Result<Self> {
        let n = data.nrows();
        if k == 0 || n < k {
            return Err(Error::ModelInit(format!(
                "k-means: {} lignes pour {} clusters",
                n, k
            )));
        }

        let tol = params.tol * mean_variance(data);
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut best: Option<KMeans> = None;
        for _ in 0..params.n_init.max(1) {
            let run = lloyd(data, k, params.max_iter, tol, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        best.ok_or_else(|| Error::ModelInit("k-means: aucun essai".to_string()))
    }

    /// Centroïde le plus proche, le plus petit id en cas d'égalité.
    pub fn predict(&self, point: &[f64]) -> usize {
        nearest(&self.centroids, ArrayView1::from(point)).0
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Affectation de chaque ligne d'entraînement.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

fn lloyd(data: &Array2<f64>, k: usize, max_iter: usize, tol: f64, rng: &mut StdRng) -> KMeans {
    let mut centroids = kmeans_plus_plus(data, k, rng);
    let mut labels = vec![0; data.nrows()];
    let mut n_iter = 0;

    for _ in 0..max_iter {
        n_iter += 1;
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            labels[i] = nearest(&centroids, row).0;
        }

        let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
        let mut counts = vec![0usize; k];
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let mut target = sums.row_mut(labels[i]);
            target += &row;
            counts[labels[i]] += 1;
        }

        let mut shift = 0.0;
        for c in 0..k {
            // Cluster vide : le centroïde reste en place
            if counts[c] == 0 {
                continue;
            }
            let updated = sums.row(c).mapv(|v| v / counts[c] as f64);
            shift += sq_dist(updated.view(), centroids.row(c));
            centroids.row_mut(c).assign(&updated);
        }

        if shift <= tol {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, row) in data.axis_iter(Axis(0)).enumerate() {
        let (label, dist) = nearest(&centroids, row);
        labels[i] = label;
        inertia += dist;
    }

    KMeans { centroids, labels, inertia, n_iter }
}

/// Premier centre uniforme, les suivants tirés proportionnellement à D².
fn kmeans_plus_plus(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut d2: Vec<f64> = data
        .axis_iter(Axis(0))
        .map(|row| sq_dist(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        // Tous les points confondus avec un centre : tirage uniforme
        let idx = match WeightedIndex::new(&d2) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.random_range(0..n),
        };
        centroids.row_mut(c).assign(&data.row(idx));

        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let d = sq_dist(row, centroids.row(c));
            if d < d2[i] {
                d2[i] = d;
            }
        }
    }

    centroids
}

fn nearest(centroids: &Array2<f64>, point: ArrayView1<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = sq_dist(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_variance(data: &Array2<f64>) -> f64 {
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}
