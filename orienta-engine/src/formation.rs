use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array2, Axis};
use orienta_data::dataset::Dataset;
use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::scaler::to_matrix;
use crate::features::{FeatureSchema, MedianImputer, StandardScaler};
use crate::input::{optional_number, require_object};
use crate::models::kmeans::{KMeans, KMeansParams};
use crate::models::label_encoder::LabelEncoder;
use crate::models::random_forest::RandomForestClassifier;
use crate::models::{argmax, Classifier};

pub const FORMATION_CLUSTERS: usize = 3;
pub const TARGET_COLUMN: &str = "preferred_option";
pub const UNKNOWN_OPTION: &str = "Unknown";
pub const DEFAULT_COURSES: [&str; 1] = ["Cours généraux"];

/// Niveau de performance d'un cluster, par moyenne croissante de son centroïde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceCluster {
    Faible,
    Moyen,
    Excellent,
}

impl PerformanceCluster {
    pub const ALL: [PerformanceCluster; 3] =
        [PerformanceCluster::Faible, PerformanceCluster::Moyen, PerformanceCluster::Excellent];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCluster::Faible => "faible",
            PerformanceCluster::Moyen => "moyen",
            PerformanceCluster::Excellent => "excellent",
        }
    }
}

impl fmt::Display for PerformanceCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filières connues et leur parcours de cours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormationCategory {
    Engineering,
    Science,
    It,
    Letters,
    Arts,
    Health,
    Economics,
}

impl FormationCategory {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Engineering" => Some(FormationCategory::Engineering),
            "Science" => Some(FormationCategory::Science),
            "IT" => Some(FormationCategory::It),
            "Letters" => Some(FormationCategory::Letters),
            "Arts" => Some(FormationCategory::Arts),
            "Health" => Some(FormationCategory::Health),
            "Economics" => Some(FormationCategory::Economics),
            _ => None,
        }
    }

    pub fn courses(&self) -> [&'static str; 3] {
        match self {
            FormationCategory::Engineering => ["Math Avancé", "Physique Appliquée", "Python"],
            FormationCategory::Science => ["Biologie", "Chimie", "Statistiques"],
            FormationCategory::It => ["Algorithmique", "Développement Web", "Python"],
            FormationCategory::Letters => ["Littérature", "Communication", "Philosophie"],
            FormationCategory::Arts => ["Design", "Créativité", "Histoire de l'art"],
            FormationCategory::Health => ["Biologie", "Anatomie", "Chimie"],
            FormationCategory::Economics => ["Microéconomie", "Business", "Finance"],
        }
    }
}

pub fn courses_for(option: &str) -> Vec<String> {
    match FormationCategory::from_label(option) {
        Some(category) => category.courses().iter().map(|c| c.to_string()).collect(),
        None => DEFAULT_COURSES.iter().map(|c| c.to_string()).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarStudent {
    pub student_id: String,
    pub preferred_option: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureExplanation {
    pub name: String,
    /// Pourcentage, 2 décimales.
    pub importance: f64,
    pub student_value: f64,
    pub dataset_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanations {
    pub top_features: Vec<FeatureExplanation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationDetails {
    pub recommended_option: String,
    pub recommended_courses: Vec<String>,
    /// Pourcentages par filière, 2 décimales.
    pub option_probabilities: BTreeMap<String, f64>,
    pub cluster: PerformanceCluster,
    pub similar_students: Vec<SimilarStudent>,
    pub explanations: Explanations,
}

/// Recommandeur de formation : imputation, normalisation, forêt, k-means et plus proches voisins,
/// tous ajustés une seule fois.
#[derive(Debug, Clone)]
pub struct FormationModel {
    schema: FeatureSchema,
    imputer: MedianImputer,
    scaler: StandardScaler,
    encoder: LabelEncoder,
    forest: RandomForestClassifier,
    kmeans: KMeans,
    /// Étiquette de performance indexée par id de cluster k-means.
    cluster_labels: [PerformanceCluster; FORMATION_CLUSTERS],
    x_scaled: Array2<f64>,
    feature_means: Vec<f64>,
    /// (indice de feature, importance), importance décroissante.
    ranked_features: Vec<(usize, f64)>,
    student_ids: Vec<String>,
    student_options: Vec<String>,
    neighbors: usize,
    top_features: usize,
}

impl FormationModel {
    pub fn fit(dataset: &Dataset, config: &EngineConfig) -> Result<Self> {
        if !dataset.has_column(TARGET_COLUMN) {
            return Err(Error::ModelInit(format!("colonne '{}' absente", TARGET_COLUMN)));
        }
        if dataset.len() < FORMATION_CLUSTERS {
            return Err(Error::ModelInit(format!(
                "{} lignes, au moins {} nécessaires",
                dataset.len(),
                FORMATION_CLUSTERS
            )));
        }

        let schema = FeatureSchema::from_dataset(dataset)?;
        let raw = schema.raw_matrix(dataset)?;
        let imputer = MedianImputer::fit(&raw, schema.columns())?;
        let x = to_matrix(&imputer.transform(&raw))?;

        let scaler = StandardScaler::fit(&x)?;
        let x_scaled = scaler.transform(&x);
        let feature_means = x
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; schema.len()]);

        let student_options: Vec<String> = dataset
            .text_column(TARGET_COLUMN)?
            .into_iter()
            .map(|o| o.unwrap_or(UNKNOWN_OPTION).to_string())
            .collect();
        let encoder = LabelEncoder::fit(student_options.as_slice());
        let labels = student_options
            .iter()
            .map(|o| encoder.encode(o))
            .collect::<Result<Vec<_>>>()?;

        let rows: Vec<Vec<f64>> = x_scaled.rows().into_iter().map(|r| r.to_vec()).collect();
        let forest = RandomForestClassifier::fit(
            &rows,
            &labels,
            encoder.len(),
            config.formation_trees,
            config.seed,
        )?;

        let params = KMeansParams {
            n_init: config.formation_n_init,
            max_iter: config.kmeans_max_iter,
            tol: config.kmeans_tol,
            seed: config.seed,
        };
        let kmeans = KMeans::fit(&x_scaled, FORMATION_CLUSTERS, &params)?;
        let cluster_labels = rank_clusters(&kmeans);

        let mut ranked_features: Vec<(usize, f64)> =
            forest.feature_importances().iter().copied().enumerate().collect();
        ranked_features.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let student_ids = (0..dataset.len())
            .map(|row| dataset.text(row, "student_id").unwrap_or("").to_string())
            .collect();

        log::info!(
            "Recommandeur de formation ajusté: {} lignes, {} features, {} filières, {} arbres",
            dataset.len(),
            schema.len(),
            encoder.len(),
            forest.n_trees()
        );

        Ok(Self {
            schema,
            imputer,
            scaler,
            encoder,
            forest,
            kmeans,
            cluster_labels,
            x_scaled,
            feature_means,
            ranked_features,
            student_ids,
            student_options,
            neighbors: config.neighbors,
            top_features: config.top_features,
        })
    }

    /// Profil partiel → filière recommandée, probabilités, cluster, voisins et explications.
    pub fn get_recommendation_details(&self, profile: &Value) -> Result<RecommendationDetails> {
        require_object(profile)?;

        let raw = self
            .schema
            .columns()
            .iter()
            .map(|c| optional_number(profile, c))
            .collect::<Result<Vec<_>>>()?;
        let student = self.imputer.transform_row(&raw);
        let scaled = self.scaler.transform_row(&student);

        let proba = self.forest.predict_proba(&scaled);
        let option_probabilities = self
            .encoder
            .classes()
            .iter()
            .zip(&proba)
            .map(|(class, p)| (class.clone(), round2(p * 100.0)))
            .collect();

        let recommended_option = self.encoder.decode(argmax(&proba))?.to_string();
        let recommended_courses = courses_for(&recommended_option);

        let cluster = self.cluster_label(self.kmeans.predict(&scaled))?;

        Ok(RecommendationDetails {
            recommended_option,
            recommended_courses,
            option_probabilities,
            cluster,
            similar_students: self.similar_students(&scaled),
            explanations: Explanations { top_features: self.explain(&student) },
        })
    }

    /// Les `neighbors` lignes les plus proches en distance euclidienne (espace normalisé).
    fn similar_students(&self, scaled: &[f64]) -> Vec<SimilarStudent> {
        let mut distances: Vec<(usize, f64)> = self
            .x_scaled
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let d2: f64 = row.iter().zip(scaled).map(|(a, b)| (a - b) * (a - b)).sum();
                (i, d2.sqrt())
            })
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        distances
            .into_iter()
            .take(self.neighbors)
            .map(|(i, distance)| SimilarStudent {
                student_id: self.student_ids[i].clone(),
                preferred_option: self.student_options[i].clone(),
                distance,
            })
            .collect()
    }

    fn explain(&self, student: &[f64]) -> Vec<FeatureExplanation> {
        self.ranked_features
            .iter()
            .take(self.top_features)
            .map(|&(idx, importance)| FeatureExplanation {
                name: self.schema.columns()[idx].clone(),
                importance: round2(importance * 100.0),
                student_value: student[idx],
                dataset_mean: self.feature_means[idx],
            })
            .collect()
    }

    fn cluster_label(&self, id: usize) -> Result<PerformanceCluster> {
        self.cluster_labels
            .get(id)
            .copied()
            .ok_or_else(|| Error::Prediction(format!("cluster de formation inattendu: {}", id)))
    }

    /// Étiquette de performance de chaque ligne d'entraînement.
    pub fn cluster_assignments(&self) -> Vec<PerformanceCluster> {
        self.kmeans
            .labels()
            .iter()
            .map(|&id| self.cluster_labels[id])
            .collect()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classes(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn forest(&self) -> &RandomForestClassifier {
        &self.forest
    }

    pub fn medians(&self) -> &[f64] {
        self.imputer.medians()
    }

    /// (nom, importance) par importance décroissante.
    pub fn ranked_features(&self) -> Vec<(&str, f64)> {
        self.ranked_features
            .iter()
            .map(|&(idx, imp)| (self.schema.columns()[idx].as_str(), imp))
            .collect()
    }
}

/// Tri stable des centroïdes par moyenne croissante de leurs coordonnées.
fn rank_clusters(kmeans: &KMeans) -> [PerformanceCluster; FORMATION_CLUSTERS] {
    let centroids = kmeans.centroids();
    let means: Vec<f64> = centroids
        .rows()
        .into_iter()
        .map(|r| r.mean().unwrap_or(0.0))
        .collect();

    let mut order: Vec<usize> = (0..means.len()).collect();
    order.sort_by(|&a, &b| means[a].partial_cmp(&means[b]).unwrap_or(Ordering::Equal));

    let mut labels = [PerformanceCluster::Faible; FORMATION_CLUSTERS];
    for (rank, &id) in order.iter().enumerate() {
        labels[id] = PerformanceCluster::ALL[rank];
    }
    labels
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use orienta_data::dataset::make_test_dataset;
    use serde_json::json;

    fn fitted(n: usize) -> FormationModel {
        let config = EngineConfig { formation_trees: 40, ..Default::default() };
        FormationModel::fit(&make_test_dataset(n), &config).unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_100() {
        let model = fitted(80);
        let details = model
            .get_recommendation_details(&json!({"math_score": 17, "physics_score": 16}))
            .unwrap();
        let total: f64 = details.option_probabilities.values().sum();
        assert!((total - 100.0).abs() <= 0.1, "total = {}", total);
        assert_eq!(details.option_probabilities.len(), model.classes().len());
        assert!(model.classes().contains(&details.recommended_option));
    }

    #[test]
    fn test_recommended_option_is_most_probable() {
        let model = fitted(80);
        let details = model.get_recommendation_details(&json!({"literature_score": 19})).unwrap();
        let best = details.option_probabilities[&details.recommended_option];
        assert!(details.option_probabilities.values().all(|&p| p <= best));
        assert_eq!(details.recommended_courses, courses_for(&details.recommended_option));
    }

    #[test]
    fn test_similar_students_sorted() {
        let model = fitted(80);
        let details = model.get_recommendation_details(&json!({"age": 18})).unwrap();
        assert_eq!(details.similar_students.len(), 10);
        for pair in details.similar_students.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert!(details.similar_students[0].student_id.starts_with('S'));
    }

    #[test]
    fn test_small_dataset_returns_all_neighbours() {
        let model = fitted(6);
        let details = model.get_recommendation_details(&json!({})).unwrap();
        assert_eq!(details.similar_students.len(), 6);
    }

    #[test]
    fn test_training_row_is_its_own_nearest_neighbour() {
        let ds = make_test_dataset(50);
        let config = EngineConfig { formation_trees: 20, ..Default::default() };
        let model = FormationModel::fit(&ds, &config).unwrap();

        let record = &ds.records()[7];
        let mut profile = serde_json::Map::new();
        for column in model.schema().columns() {
            if let Some(v) = ds.text(7, column) {
                profile.insert(column.clone(), json!(v));
            }
        }
        let details = model.get_recommendation_details(&Value::Object(profile)).unwrap();
        assert_eq!(details.similar_students[0].student_id, record.student_id.clone().unwrap());
        assert!(details.similar_students[0].distance < 1e-9);
    }

    #[test]
    fn test_explanations() {
        let model = fitted(80);
        let details = model.get_recommendation_details(&json!({"math_score": "12"})).unwrap();
        let top = &details.explanations.top_features;
        assert_eq!(top.len(), 5);
        for pair in top.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }

        let all: f64 = model.ranked_features().iter().map(|(_, imp)| imp).sum();
        assert!((all - 1.0).abs() < 1e-9);

        if let Some(math) = top.iter().find(|f| f.name == "math_score") {
            assert_eq!(math.student_value, 12.0);
        }
    }

    #[test]
    fn test_missing_values_use_medians() {
        let model = fitted(40);
        let details = model.get_recommendation_details(&json!({"age": null})).unwrap();
        let age_idx = model.schema().position("age").unwrap();
        for f in &details.explanations.top_features {
            if f.name == "age" {
                assert_eq!(f.student_value, model.medians()[age_idx]);
            }
        }
    }

    #[test]
    fn test_cluster_labels_follow_centroid_means() {
        let model = fitted(80);
        let centroid_mean = |label: PerformanceCluster| {
            let id = model.cluster_labels.iter().position(|&l| l == label).unwrap();
            model.kmeans.centroids().row(id).mean().unwrap()
        };
        assert!(centroid_mean(PerformanceCluster::Faible) <= centroid_mean(PerformanceCluster::Moyen));
        assert!(centroid_mean(PerformanceCluster::Moyen) <= centroid_mean(PerformanceCluster::Excellent));
        assert_eq!(model.cluster_assignments().len(), 80);
    }

    #[test]
    fn test_invalid_profile_value() {
        let model = fitted(30);
        let err = model.get_recommendation_details(&json!({"math_score": "beaucoup"})).unwrap_err();
        assert!(err.is_user_error());
        assert!(model.get_recommendation_details(&json!([1, 2])).unwrap_err().is_user_error());
    }

    #[test]
    fn test_missing_target_column_is_fatal() {
        let ds = Dataset::from_reader("math_score,age\n12,18\n13,19\n14,20\n".as_bytes()).unwrap();
        assert!(matches!(
            FormationModel::fit(&ds, &EngineConfig::default()),
            Err(Error::ModelInit(_))
        ));
    }

    #[test]
    fn test_missing_option_becomes_unknown() {
        let csv = "student_id,math_score,preferred_option\n1,12,IT\n2,15,\n3,8,Arts\n4,18,IT\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        let config = EngineConfig { formation_trees: 10, ..Default::default() };
        let model = FormationModel::fit(&ds, &config).unwrap();
        assert_eq!(model.classes(), &["Arts", "IT", "Unknown"]);
    }

    #[test]
    fn test_courses_table() {
        assert_eq!(courses_for("IT"), vec!["Algorithmique", "Développement Web", "Python"]);
        assert_eq!(courses_for("Health"), vec!["Biologie", "Anatomie", "Chimie"]);
        assert_eq!(courses_for("Astronomie"), vec!["Cours généraux"]);
    }

    #[test]
    fn test_performance_cluster_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&PerformanceCluster::Excellent).unwrap(), "\"excellent\"");
    }
}
