use std::sync::Arc;

use orienta_engine::ModelBundle;

use crate::journal::PredictionLog;

/// État partagé entre workers : modèles en lecture seule et journal des prédictions.
pub struct AppState {
    pub models: Arc<ModelBundle>,
    pub journal: PredictionLog,
}

impl AppState {
    pub fn new(models: Arc<ModelBundle>) -> Self {
        Self { models, journal: PredictionLog::default() }
    }
}
