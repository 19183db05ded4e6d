use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Impossible de lire {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV invalide: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset introuvable. Ajoutez 'etudiants.csv' à {dir:?} ou un CSV dans {data_dir:?}.")]
    NotFound { dir: PathBuf, data_dir: PathBuf },

    #[error("Valeur non numérique '{value}' pour '{column}' (ligne {row})")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Niveau invalide: '{0}' (attendu A, B, C ou D)")]
    InvalidLevel(String),

    #[error("Code de niveau invalide: {0} (attendu 0 à 3)")]
    InvalidLevelCode(u8),

    #[error("Colonne manquante: '{0}'")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, Error>;
