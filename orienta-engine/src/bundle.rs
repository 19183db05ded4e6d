use std::path::Path;
use std::sync::Arc;

use orienta_data::dataset::{resolve_path, Dataset};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::explore::{self, ClusteredStudents, DatasetStats, ExplorationOverview, StudentRow};
use crate::formation::{FormationModel, RecommendationDetails};
use crate::tier::{PredictionResult, TierModel};

/// Tous les modèles, ajustés une fois au démarrage puis partagés en lecture seule.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    dataset: Arc<Dataset>,
    config: EngineConfig,
    tier: TierModel,
    formation: FormationModel,
}

impl ModelBundle {
    pub fn fit(dataset: Arc<Dataset>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let (tier, formation) = rayon::join(
            || TierModel::fit(&dataset, &config),
            || FormationModel::fit(&dataset, &config),
        );
        let tier = tier?;
        let formation = formation?;

        #[cfg(feature = "diagnostics")]
        crate::diagnostics::report(&dataset, config.seed);

        Ok(Self { dataset, config, tier, formation })
    }

    /// Résout le fichier dans `dir` (fichier principal puis replis), le charge et ajuste les modèles.
    pub fn from_dir(dir: &Path, config: EngineConfig) -> Result<Self> {
        let path = resolve_path(dir)?;
        log::info!("Jeu de données: {}", path.display());
        let dataset = Dataset::load_csv(&path)?;
        Self::fit(Arc::new(dataset), config)
    }

    pub fn predict_student(&self, body: &Value) -> Result<PredictionResult> {
        self.tier.predict_student(body)
    }

    pub fn get_recommendation_details(&self, profile: &Value) -> Result<RecommendationDetails> {
        self.formation.get_recommendation_details(profile)
    }

    pub fn formations(&self) -> Vec<String> {
        explore::formations(&self.dataset)
    }

    pub fn stats(&self) -> DatasetStats {
        explore::stats(&self.dataset)
    }

    pub fn students(&self) -> Vec<StudentRow> {
        explore::students(&self.dataset)
    }

    pub fn clustered_students(&self) -> ClusteredStudents {
        explore::clustered_students(&self.dataset, &self.formation.cluster_assignments())
    }

    pub fn exploration_overview(&self) -> ExplorationOverview {
        explore::exploration_overview(&self.dataset, &self.formation.cluster_assignments())
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tier(&self) -> &TierModel {
        &self.tier
    }

    pub fn formation(&self) -> &FormationModel {
        &self.formation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::formation::PerformanceCluster;
    use orienta_data::dataset::{make_test_csv, make_test_dataset, PRIMARY_FILE};
    use serde_json::json;

    fn test_config() -> EngineConfig {
        EngineConfig { formation_trees: 30, ..Default::default() }
    }

    #[test]
    fn test_bundle_fit_and_predict() {
        let bundle = ModelBundle::fit(Arc::new(make_test_dataset(60)), test_config()).unwrap();
        let result = bundle.predict_student(&json!({"math_score": 17, "communication": 8})).unwrap();
        assert!(result.cluster_soft < 5);

        let details = bundle.get_recommendation_details(&json!({"math_score": 17})).unwrap();
        assert!(!details.recommended_courses.is_empty());
        assert!(PerformanceCluster::ALL.contains(&details.cluster));
    }

    #[test]
    fn test_bundle_views() {
        let bundle = ModelBundle::fit(Arc::new(make_test_dataset(40)), test_config()).unwrap();
        assert_eq!(bundle.students().len(), 40);
        assert_eq!(bundle.stats().total_students, 40);
        assert!(!bundle.formations().is_empty());

        let clustered = bundle.clustered_students();
        assert_eq!(clustered.counts.values().sum::<usize>(), 40);

        let overview = bundle.exploration_overview();
        assert_eq!(overview.option_counts.iter().map(|c| c.count).sum::<usize>(), 40);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig { tier_max_depth: 0, ..Default::default() };
        let err = ModelBundle::fit(Arc::new(make_test_dataset(20)), config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_dir() {
        let dir = std::env::temp_dir().join(format!("orienta_bundle_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(ModelBundle::from_dir(&dir, test_config()).is_err());

        std::fs::write(dir.join(PRIMARY_FILE), make_test_csv(30)).unwrap();
        let bundle = ModelBundle::from_dir(&dir, test_config()).unwrap();
        assert_eq!(bundle.dataset().len(), 30);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
