use std::sync::Mutex;

use orienta_data::levels::GlobalLevel;
use orienta_engine::tier::PredictionResult;
use serde::Serialize;
use serde_json::Value;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Une prédiction servie : entrées telles que reçues et résultat.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionLogEntry {
    pub timestamp: String,
    pub age: Value,
    pub gender: Value,
    pub region: Value,
    pub math_score: Value,
    pub physics_score: Value,
    pub literature_score: Value,
    pub english_score: Value,
    pub communication: Value,
    pub teamwork: Value,
    pub leadership: Value,
    pub problem_solving: Value,
    pub predicted_level: GlobalLevel,
    pub cluster_soft: usize,
    pub recommendation: String,
}

impl PredictionLogEntry {
    pub fn new(body: &Value, result: &PredictionResult) -> Self {
        let raw = |field: &str| body.get(field).cloned().unwrap_or(Value::Null);
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            age: raw("age"),
            gender: raw("gender"),
            region: raw("region"),
            math_score: raw("math_score"),
            physics_score: raw("physics_score"),
            literature_score: raw("literature_score"),
            english_score: raw("english_score"),
            communication: raw("communication"),
            teamwork: raw("teamwork"),
            leadership: raw("leadership"),
            problem_solving: raw("problem_solving"),
            predicted_level: result.predicted_level,
            cluster_soft: result.cluster_soft,
            recommendation: result.recommendation.clone(),
        }
    }
}

/// Journal en mémoire, en ajout seul, perdu à l'arrêt.
#[derive(Debug, Default)]
pub struct PredictionLog {
    entries: Mutex<Vec<PredictionLogEntry>>,
}

impl PredictionLog {
    pub fn append(&self, entry: PredictionLogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    pub fn snapshot(&self) -> Vec<PredictionLogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
