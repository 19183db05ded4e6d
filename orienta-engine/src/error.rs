use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] orienta_data::Error),

    #[error("Entrée invalide: {0}")]
    InvalidInput(String),

    #[error("Initialisation du modèle impossible: {0}")]
    ModelInit(String),

    #[error("Cluster inconnu: {0} (attendu 0 à 4)")]
    UnknownCluster(usize),

    #[error("Erreur de prédiction: {0}")]
    Prediction(String),

    #[error("Configuration invalide: {0}")]
    Config(String),
}

impl Error {
    /// Erreur imputable à la requête (400) plutôt qu'au modèle (500).
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
