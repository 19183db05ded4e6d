pub mod scaler;

use std::cmp::Ordering;

use orienta_data::dataset::Dataset;

use crate::error::{Error, Result};

pub use scaler::StandardScaler;

/// Colonnes candidates du recommandeur de formation, dans l'ordre des features.
pub const FORMATION_FEATURE_CANDIDATES: [&str; 13] = [
    "math_score",
    "physics_score",
    "chemistry_score",
    "biology_score",
    "literature_score",
    "english_score",
    "communication",
    "teamwork",
    "leadership",
    "problem_solving",
    "age",
    "parent_income",
    "attendance_rate",
];

/// Sous-ensemble des candidates présent dans le jeu de données.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let columns: Vec<String> = FORMATION_FEATURE_CANDIDATES
            .iter()
            .filter(|c| dataset.has_column(c))
            .map(|c| c.to_string())
            .collect();

        if columns.is_empty() {
            return Err(Error::ModelInit(
                "aucune colonne de features exploitable dans le jeu de données".to_string(),
            ));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Matrice brute (ligne par étudiant), valeurs manquantes conservées.
    pub fn raw_matrix(&self, dataset: &Dataset) -> Result<Vec<Vec<Option<f64>>>> {
        let columns = self
            .columns
            .iter()
            .map(|c| dataset.numeric_column(c))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((0..dataset.len())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect())
    }
}

/// Remplace les valeurs manquantes par la médiane de la colonne à l'ajustement.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    pub fn fit(rows: &[Vec<Option<f64>>], columns: &[String]) -> Result<Self> {
        let medians = columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let mut values: Vec<f64> = rows.iter().filter_map(|r| r[j]).collect();
                median(&mut values).ok_or_else(|| {
                    Error::ModelInit(format!("colonne '{}' sans aucune valeur", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { medians })
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    pub fn transform_row(&self, row: &[Option<f64>]) -> Vec<f64> {
        row.iter()
            .zip(&self.medians)
            .map(|(v, &m)| v.unwrap_or(m))
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Médiane, moyenne des deux valeurs centrales pour un effectif pair.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orienta_data::dataset::make_test_dataset;

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_schema_keeps_candidate_order() {
        let ds = make_test_dataset(10);
        let schema = FeatureSchema::from_dataset(&ds).unwrap();
        // chemistry_score et biology_score absents du jeu de test
        assert_eq!(schema.len(), 11);
        assert_eq!(schema.columns()[0], "math_score");
        assert_eq!(schema.columns()[2], "literature_score");
        assert_eq!(schema.columns()[10], "attendance_rate");
        assert_eq!(schema.position("age"), Some(8));
        assert_eq!(schema.position("chemistry_score"), None);
    }

    #[test]
    fn test_empty_schema_is_fatal() {
        let ds = Dataset::from_reader("student_id,preferred_option\n1,IT\n".as_bytes()).unwrap();
        assert!(matches!(FeatureSchema::from_dataset(&ds), Err(Error::ModelInit(_))));
    }

    #[test]
    fn test_imputer_uses_fit_medians() {
        let rows = vec![
            vec![Some(1.0), None],
            vec![Some(3.0), Some(10.0)],
            vec![None, Some(20.0)],
        ];
        let columns = vec!["a".to_string(), "b".to_string()];
        let imputer = MedianImputer::fit(&rows, &columns).unwrap();
        assert_eq!(imputer.medians(), &[2.0, 15.0]);
        assert_eq!(imputer.transform_row(&[None, Some(4.0)]), vec![2.0, 4.0]);
    }

    #[test]
    fn test_imputer_all_missing_column_is_fatal() {
        let rows = vec![vec![Some(1.0), None], vec![Some(2.0), None]];
        let columns = vec!["a".to_string(), "b".to_string()];
        let err = MedianImputer::fit(&rows, &columns).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }
}
