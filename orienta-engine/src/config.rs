use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparamètres des modèles, fixés au démarrage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: u64,
    pub tier_max_depth: usize,
    pub soft_n_init: usize,
    pub formation_trees: usize,
    pub formation_n_init: usize,
    pub kmeans_max_iter: usize,
    pub kmeans_tol: f64,
    pub neighbors: usize,
    pub top_features: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tier_max_depth: 8,
            soft_n_init: 10,
            formation_trees: 200,
            formation_n_init: 1,
            kmeans_max_iter: 300,
            kmeans_tol: 1e-4,
            neighbors: 10,
            top_features: 5,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Impossible de lire {:?}: {}", path, e)))?;
        let config: EngineConfig = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("JSON invalide dans {:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tier_max_depth == 0 {
            return Err(Error::Config("tier_max_depth doit être > 0".to_string()));
        }
        if self.formation_trees == 0 {
            return Err(Error::Config("formation_trees doit être > 0".to_string()));
        }
        if self.soft_n_init == 0 || self.formation_n_init == 0 {
            return Err(Error::Config("n_init doit être > 0".to_string()));
        }
        if self.kmeans_max_iter == 0 {
            return Err(Error::Config("kmeans_max_iter doit être > 0".to_string()));
        }
        if self.kmeans_tol.is_nan() || self.kmeans_tol < 0.0 {
            return Err(Error::Config(format!("kmeans_tol invalide: {}", self.kmeans_tol)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.tier_max_depth, 8);
        assert_eq!(config.formation_trees, 200);
        assert_eq!(config.neighbors, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"formation_trees": 50}"#).unwrap();
        assert_eq!(config.formation_trees, 50);
        assert_eq!(config.tier_max_depth, 8);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig { formation_trees: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("orienta_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"seed": 7, "neighbors": 3}"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.neighbors, 3);
        let _ = std::fs::remove_file(&path);
    }
}
