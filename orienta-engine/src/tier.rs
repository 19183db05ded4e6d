use ndarray::Array2;
use orienta_data::dataset::Dataset;
use orienta_data::levels::{aggregate, score_to_level, GlobalLevel, LevelLetter, Subject};
use orienta_data::models::{SoftSkill, SoftSkillProfile};
use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::input::number_or_default;
use crate::models::Classifier;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::kmeans::{KMeans, KMeansParams};
use crate::recommendation::Recommendation;

pub const SOFT_CLUSTERS: usize = 5;

/// Requête de prédiction : quatre notes sur 20 et quatre soft skills.
#[derive(Debug, Clone, PartialEq)]
pub struct TierInput {
    pub scores: [f64; 4],
    pub soft_skills: SoftSkillProfile,
}

impl TierInput {
    /// Champs absents → 0. Valeur non numérique ou `null` → `InvalidInput`.
    pub fn from_json(body: &Value) -> Result<Self> {
        let mut scores = [0.0; 4];
        for (score, subject) in scores.iter_mut().zip(Subject::ALL) {
            *score = number_or_default(body, subject.score_column(), 0.0)?;
        }
        let mut soft = [0.0; 4];
        for (value, skill) in soft.iter_mut().zip(SoftSkill::ALL) {
            *value = number_or_default(body, skill.column(), 0.0)?;
        }
        Ok(Self { scores, soft_skills: SoftSkillProfile::from_array(soft) })
    }

    pub fn letters(&self) -> [LevelLetter; 4] {
        self.scores.map(|s| score_to_level(Some(s)))
    }
}

/// [4 niveaux encodés ++ 4 soft skills bruts]
pub fn tier_features(letters: &[LevelLetter; 4], soft: &SoftSkillProfile) -> Vec<f64> {
    letters
        .iter()
        .map(|l| l.encode() as f64)
        .chain(soft.to_array())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub predicted_level: GlobalLevel,
    pub cluster_soft: usize,
    /// Bloc HTML du frontend.
    pub recommendation: String,
    #[serde(skip)]
    pub details: Recommendation,
}

/// Moyennes des soft skills par cluster, arrondies à 2 décimales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    pub communication: f64,
    pub teamwork: f64,
    pub leadership: f64,
    pub problem_solving: f64,
}

/// Classifieur de niveau global + k-means des soft skills.
#[derive(Debug, Clone)]
pub struct TierModel {
    classifier: DecisionTreeClassifier,
    soft_kmeans: KMeans,
    profiles: Vec<ClusterProfile>,
    n_train: usize,
}

impl TierModel {
    pub fn fit(dataset: &Dataset, config: &EngineConfig) -> Result<Self> {
        for subject in Subject::ALL {
            if !dataset.has_column(subject.level_column()) && !dataset.has_column(subject.score_column()) {
                return Err(Error::ModelInit(format!(
                    "ni '{}' ni '{}' dans le jeu de données",
                    subject.level_column(),
                    subject.score_column()
                )));
            }
        }

        let records = dataset.records();
        if records.len() < SOFT_CLUSTERS {
            return Err(Error::ModelInit(format!(
                "{} lignes, au moins {} nécessaires",
                records.len(),
                SOFT_CLUSTERS
            )));
        }

        let mut features = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for record in records {
            let letters = record.subject_letters();
            features.push(tier_features(&letters, &record.soft_skills));
            labels.push(aggregate(&letters).index());
        }

        let classifier = DecisionTreeClassifier::fit(
            &features,
            &labels,
            GlobalLevel::ALL.len(),
            Some(config.tier_max_depth),
            config.seed,
        )?;

        let soft = Array2::from_shape_fn((records.len(), 4), |(i, j)| {
            records[i].soft_skills.to_array()[j]
        });
        let params = KMeansParams {
            n_init: config.soft_n_init,
            max_iter: config.kmeans_max_iter,
            tol: config.kmeans_tol,
            seed: config.seed,
        };
        let soft_kmeans = KMeans::fit(&soft, SOFT_CLUSTERS, &params)?;
        let profiles = cluster_profiles(&soft, soft_kmeans.labels());

        log::info!(
            "Modèle de niveau ajusté: {} lignes, profondeur {}, inertie soft skills {:.2}",
            records.len(),
            classifier.depth(),
            soft_kmeans.inertia()
        );

        Ok(Self { classifier, soft_kmeans, profiles, n_train: records.len() })
    }

    pub fn predict_level(&self, letters: &[LevelLetter; 4], soft: &SoftSkillProfile) -> Result<GlobalLevel> {
        let class = self.classifier.predict(&tier_features(letters, soft));
        GlobalLevel::from_index(class)
            .ok_or_else(|| Error::Prediction(format!("classe de niveau inattendue: {}", class)))
    }

    pub fn predict_cluster(&self, soft: &SoftSkillProfile) -> usize {
        self.soft_kmeans.predict(&soft.to_array())
    }

    pub fn predict(&self, input: &TierInput) -> Result<PredictionResult> {
        let letters = input.letters();
        let predicted_level = self.predict_level(&letters, &input.soft_skills)?;
        let cluster_soft = self.predict_cluster(&input.soft_skills);
        let details = Recommendation::compose(predicted_level, cluster_soft, &letters, &input.soft_skills)?;

        Ok(PredictionResult {
            predicted_level,
            cluster_soft,
            recommendation: details.to_html(),
            details,
        })
    }

    /// Prédiction depuis le corps JSON brut d'une requête.
    pub fn predict_student(&self, body: &Value) -> Result<PredictionResult> {
        let input = TierInput::from_json(body)?;
        self.predict(&input)
    }

    pub fn cluster_profiles(&self) -> &[ClusterProfile] {
        &self.profiles
    }

    pub fn classifier(&self) -> &DecisionTreeClassifier {
        &self.classifier
    }

    pub fn soft_kmeans(&self) -> &KMeans {
        &self.soft_kmeans
    }

    pub fn n_train(&self) -> usize {
        self.n_train
    }
}

fn cluster_profiles(soft: &Array2<f64>, labels: &[usize]) -> Vec<ClusterProfile> {
    let round2 = |v: f64| (v * 100.0).round() / 100.0;

    (0..SOFT_CLUSTERS)
        .map(|cluster| {
            let rows: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == cluster).collect();
            let mean = |j: usize| {
                if rows.is_empty() {
                    0.0
                } else {
                    round2(rows.iter().map(|&i| soft[[i, j]]).sum::<f64>() / rows.len() as f64)
                }
            };
            ClusterProfile {
                cluster,
                size: rows.len(),
                communication: mean(0),
                teamwork: mean(1),
                leadership: mean(2),
                problem_solving: mean(3),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::SoftCluster;
    use orienta_data::dataset::make_test_dataset;
    use serde_json::json;

    /// Huit profils distincts, dont exactement la requête de bout en bout.
    fn small_dataset() -> Dataset {
        let csv = "\
math_score,physics_score,literature_score,english_score,communication,teamwork,leadership,problem_solving
18,15,9,6,9,3,7,5
18,18,18,5,2,2,2,2
13,13,5,18,5,6,7,8
9,9,9,13,1,9,3,4
2,3,9,13,8,8,1,1
5,5,5,5,3,3,3,3
14,14,14,14,10,10,10,10
10,12,10,17,6,2,9,7
";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    fn query() -> Value {
        json!({
            "age": 19, "gender": "F", "region": "Nord",
            "math_score": 18, "physics_score": 15, "literature_score": 9, "english_score": 6,
            "communication": 9, "teamwork": 3, "leadership": 7, "problem_solving": 5
        })
    }

    #[test]
    fn test_end_to_end_prediction() {
        let model = TierModel::fit(&small_dataset(), &EngineConfig::default()).unwrap();
        let result = model.predict_student(&query()).unwrap();

        assert_eq!(result.predicted_level, GlobalLevel::Level4);
        assert!(result.cluster_soft < SOFT_CLUSTERS);
        assert_eq!(result.details.strengths, vec!["Math"]);
        assert_eq!(result.details.weaknesses, vec!["Literature", "English"]);

        let advice = SoftCluster::try_from(result.cluster_soft).unwrap().advice();
        assert!(result.recommendation.contains(advice));
        assert!(result.recommendation.contains("Level 4"));
    }

    #[test]
    fn test_training_rows_fit_exactly() {
        let ds = small_dataset();
        let model = TierModel::fit(&ds, &EngineConfig::default()).unwrap();
        for record in ds.records() {
            let letters = record.subject_letters();
            let level = model.predict_level(&letters, &record.soft_skills).unwrap();
            assert_eq!(level, aggregate(&letters));
        }
    }

    #[test]
    fn test_predictions_idempotent() {
        let model = TierModel::fit(&make_test_dataset(60), &EngineConfig::default()).unwrap();
        let a = model.predict_student(&query()).unwrap();
        let b = model.predict_student(&query()).unwrap();
        assert_eq!(a.predicted_level, b.predicted_level);
        assert_eq!(a.cluster_soft, b.cluster_soft);
        assert_eq!(a.recommendation, b.recommendation);
    }

    #[test]
    fn test_cluster_profiles_cover_training_set() {
        let model = TierModel::fit(&make_test_dataset(60), &EngineConfig::default()).unwrap();
        let profiles = model.cluster_profiles();
        assert_eq!(profiles.len(), SOFT_CLUSTERS);
        assert_eq!(profiles.iter().map(|p| p.size).sum::<usize>(), 60);
        for p in profiles {
            assert!((0.0..=10.0).contains(&p.communication));
        }
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let input = TierInput::from_json(&json!({"math_score": 16})).unwrap();
        assert_eq!(input.scores, [16.0, 0.0, 0.0, 0.0]);
        assert_eq!(input.letters(), [LevelLetter::A, LevelLetter::D, LevelLetter::D, LevelLetter::D]);
        assert_eq!(input.soft_skills, SoftSkillProfile::default());
    }

    #[test]
    fn test_non_numeric_score_is_invalid_input() {
        let model = TierModel::fit(&small_dataset(), &EngineConfig::default()).unwrap();
        let err = model.predict_student(&json!({"math_score": "abc"})).unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_tier_features_layout() {
        let soft = SoftSkillProfile::new(9.0, 3.0, 7.0, 5.0);
        let features = tier_features(&[LevelLetter::A, LevelLetter::B, LevelLetter::C, LevelLetter::D], &soft);
        assert_eq!(features, vec![3.0, 2.0, 1.0, 0.0, 9.0, 3.0, 7.0, 5.0]);
    }

    #[test]
    fn test_fit_requires_subject_columns() {
        let ds = Dataset::from_reader("communication,teamwork\n1,2\n".as_bytes()).unwrap();
        assert!(matches!(
            TierModel::fit(&ds, &EngineConfig::default()),
            Err(Error::ModelInit(_))
        ));
    }
}
