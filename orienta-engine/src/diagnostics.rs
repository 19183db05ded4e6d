//! Régression ridge sur la satisfaction, rapport MAE / R² au démarrage.
//! Jamais consulté par les chemins de prédiction.

use std::collections::HashMap;

use faer::prelude::Solve;
use faer::{Mat, Side};
use ndarray::{Array1, Array2};
use orienta_data::dataset::Dataset;
use orienta_data::levels::Subject;
use rand::SeedableRng;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{Error, Result};
use crate::features::median;

pub const TARGET: &str = "satisfaction";
const EXCLUDED: [&str; 5] = ["satisfaction", "student_id", "enrollment_date", "overall_letter", "overall_level"];
const RIDGE_LAMBDA: f64 = 1.0;
const TEST_PERCENT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionReport {
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub mae: f64,
    pub r2: f64,
}

enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

/// Journalise le rapport, ou un avertissement en cas d'échec.
pub fn report(dataset: &Dataset, seed: u64) {
    match fit_report(dataset, seed) {
        Ok(Some(r)) => log::info!(
            "Régression satisfaction: MAE {:.3}, R² {:.3} ({} train / {} test, {} features)",
            r.mae,
            r.r2,
            r.n_train,
            r.n_test,
            r.n_features
        ),
        Ok(None) => log::warn!("Colonne '{}' absente, régression ignorée", TARGET),
        Err(e) => log::warn!("Régression satisfaction non exécutée: {}", e),
    }
}

pub fn fit_report(dataset: &Dataset, seed: u64) -> Result<Option<RegressionReport>> {
    if !dataset.has_column(TARGET) {
        return Ok(None);
    }

    let target = dataset.numeric_column(TARGET)?;
    let rows: Vec<usize> = (0..dataset.len()).filter(|&i| target[i].is_some()).collect();
    if rows.len() < 5 {
        return Err(Error::Prediction(format!("{} lignes avec satisfaction", rows.len())));
    }

    let columns = collect_columns(dataset)?;

    let mut order = rows.clone();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = (order.len() * TEST_PERCENT).div_ceil(100);
    let (test_rows, train_rows) = order.split_at(n_test);

    let encoder = Encoder::fit(&columns, train_rows);
    let x_train = encoder.transform(&columns, train_rows);
    let x_test = encoder.transform(&columns, test_rows);
    let y = |rows: &[usize]| Array1::from_iter(rows.iter().map(|&i| target[i].unwrap_or(0.0)));
    let (y_train, y_test) = (y(train_rows), y(test_rows));

    let weights = ridge(&x_train, &y_train, RIDGE_LAMBDA)?;
    let pred = x_test.dot(&weights);

    let mae = (&pred - &y_test).mapv(f64::abs).mean().unwrap_or(0.0);
    let y_mean = y_test.mean().unwrap_or(0.0);
    let ss_res: f64 = (&y_test - &pred).mapv(|v| v * v).sum();
    let ss_tot: f64 = y_test.mapv(|v| (v - y_mean) * (v - y_mean)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(Some(RegressionReport {
        n_train: train_rows.len(),
        n_test: test_rows.len(),
        n_features: x_train.ncols() - 1,
        mae,
        r2,
    }))
}

/// Colonnes numériques et catégorielles, hors cible, identifiants et niveaux par matière.
fn collect_columns(dataset: &Dataset) -> Result<Vec<Column>> {
    let level_columns: Vec<&str> = Subject::ALL.iter().map(|s| s.level_column()).collect();

    let mut columns = Vec::new();
    for name in dataset.columns() {
        if EXCLUDED.contains(&name.as_str()) || level_columns.contains(&name.as_str()) {
            continue;
        }
        match dataset.numeric_column(name) {
            Ok(values) => columns.push(Column::Numeric(values)),
            Err(orienta_data::Error::NotNumeric { .. }) => {
                let values = dataset
                    .text_column(name)?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect();
                columns.push(Column::Categorical(values));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(columns)
}

enum ColumnEncoding {
    Numeric { median: f64, mean: f64, std: f64 },
    OneHot { fill: String, categories: Vec<String> },
    Skip,
}

/// Imputation + normalisation (numérique) ou one-hot (catégoriel), ajustés sur le train.
struct Encoder {
    encodings: Vec<ColumnEncoding>,
    width: usize,
}

impl Encoder {
    fn fit(columns: &[Column], rows: &[usize]) -> Self {
        let encodings: Vec<ColumnEncoding> = columns
            .iter()
            .map(|column| match column {
                Column::Numeric(values) => {
                    let mut present: Vec<f64> = rows.iter().filter_map(|&i| values[i]).collect();
                    let Some(med) = median(&mut present) else {
                        return ColumnEncoding::Skip;
                    };
                    let filled: Vec<f64> = rows.iter().map(|&i| values[i].unwrap_or(med)).collect();
                    let mean = filled.iter().sum::<f64>() / filled.len() as f64;
                    let var = filled.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / filled.len() as f64;
                    let std = if var > 0.0 { var.sqrt() } else { 1.0 };
                    ColumnEncoding::Numeric { median: med, mean, std }
                }
                Column::Categorical(values) => {
                    let mut counts: HashMap<&str, usize> = HashMap::new();
                    for &i in rows {
                        if let Some(v) = values[i].as_deref() {
                            *counts.entry(v).or_insert(0) += 1;
                        }
                    }
                    let mut categories: Vec<String> = counts.keys().map(|k| k.to_string()).collect();
                    categories.sort();
                    // Valeur la plus fréquente, la plus petite en cas d'égalité
                    let fill = categories
                        .iter()
                        .max_by(|a, b| counts[a.as_str()].cmp(&counts[b.as_str()]).then(b.cmp(a)))
                        .cloned();
                    match fill {
                        Some(fill) => ColumnEncoding::OneHot { fill, categories },
                        None => ColumnEncoding::Skip,
                    }
                }
            })
            .collect();

        let width = 1 + encodings
            .iter()
            .map(|e| match e {
                ColumnEncoding::Numeric { .. } => 1,
                ColumnEncoding::OneHot { categories, .. } => categories.len(),
                ColumnEncoding::Skip => 0,
            })
            .sum::<usize>();

        Self { encodings, width }
    }

    /// Matrice avec une colonne de biais en tête.
    fn transform(&self, columns: &[Column], rows: &[usize]) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((rows.len(), self.width));
        for (r, &i) in rows.iter().enumerate() {
            x[[r, 0]] = 1.0;
            let mut j = 1;
            for (column, encoding) in columns.iter().zip(&self.encodings) {
                match (column, encoding) {
                    (Column::Numeric(values), ColumnEncoding::Numeric { median, mean, std }) => {
                        x[[r, j]] = (values[i].unwrap_or(*median) - mean) / std;
                        j += 1;
                    }
                    (Column::Categorical(values), ColumnEncoding::OneHot { fill, categories }) => {
                        let value = values[i].as_deref().unwrap_or(fill.as_str());
                        // Catégorie inconnue du train : ligne de zéros
                        if let Some(k) = categories.iter().position(|c| c == value) {
                            x[[r, j + k]] = 1.0;
                        }
                        j += categories.len();
                    }
                    _ => {}
                }
            }
        }
        x
    }
}

/// (XᵀX + λI) w = Xᵀy, biais (colonne 0) non pénalisé.
fn ridge(x: &Array2<f64>, y: &Array1<f64>, lambda: f64) -> Result<Array1<f64>> {
    let mut a = x.t().dot(x);
    for i in 1..a.nrows() {
        a[[i, i]] += lambda;
    }
    let b = x.t().dot(y);

    let a_faer = Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]]);
    let b_faer = Mat::from_fn(b.len(), 1, |i, _| b[i]);
    let llt = a_faer
        .llt(Side::Lower)
        .map_err(|_| Error::Prediction("Cholesky: matrice non définie positive".to_string()))?;
    let w = llt.solve(&b_faer);

    Ok(Array1::from_shape_fn(w.nrows(), |i| w[(i, 0)]))
}
