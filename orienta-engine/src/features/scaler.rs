use ndarray::{Array1, Array2, Axis};

use crate::error::{Error, Result};

/// Centrage-réduction (z-score) figé à l'ajustement. Écart-type de population, 0 remplacé par 1.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::ModelInit("normalisation d'une matrice vide".to_string()))?;
        let stds = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { means, stds })
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn stds(&self) -> &Array1<f64> {
        &self.stds
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut x_norm = x.clone();
        for mut row in x_norm.rows_mut() {
            row -= &self.means;
            row /= &self.stds;
        }
        x_norm
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// Lignes de même largeur → matrice ndarray.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_cols = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .map_err(|e| Error::ModelInit(format!("matrice de features invalide: {}", e)))
}
