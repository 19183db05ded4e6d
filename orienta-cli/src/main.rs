mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};

use orienta_data::dataset::{resolve_path, Dataset};
use orienta_engine::{EngineConfig, ModelBundle};

use crate::display::{
    display_bundle_info, display_clusters, display_formations, display_prediction,
    display_recommendation, display_stats,
};

#[derive(Parser)]
#[command(name = "orienta", about = "Prédiction de niveau et recommandation de formation")]
struct Cli {
    /// Fichier CSV explicite
    #[arg(long, global = true, env = "ORIENTA_DATASET")]
    dataset: Option<PathBuf>,

    /// Répertoire où chercher etudiants.csv puis data/<repli>.csv
    #[arg(long, global = true, env = "ORIENTA_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Hyperparamètres au format JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prédire le niveau global et le cluster soft skills d'un étudiant
    Predict {
        #[arg(long, default_value = "0")]
        math: f64,
        #[arg(long, default_value = "0")]
        physics: f64,
        #[arg(long, default_value = "0")]
        literature: f64,
        #[arg(long, default_value = "0")]
        english: f64,
        #[arg(long, default_value = "0")]
        communication: f64,
        #[arg(long, default_value = "0")]
        teamwork: f64,
        #[arg(long, default_value = "0")]
        leadership: f64,
        #[arg(long, default_value = "0")]
        problem_solving: f64,

        /// Afficher le bloc HTML plutôt que le texte
        #[arg(long)]
        html: bool,
    },

    /// Recommander une formation à partir d'un profil partiel
    Recommend {
        /// Profil JSON complet, ex. '{"math_score": 17}'
        #[arg(long)]
        json: Option<String>,

        /// Champ isolé colonne=valeur (répétable)
        #[arg(short, long = "set", value_name = "COLONNE=VALEUR")]
        fields: Vec<String>,
    },

    /// Statistiques du jeu de données
    Stats,

    /// Lister les formations présentes
    Formations,

    /// Profils des clusters soft skills et de performance
    Clusters,

    /// Paramètres des modèles ajustés
    Info,

    /// Régression de contrôle sur la satisfaction (MAE, R²)
    #[cfg(feature = "diagnostics")]
    Diagnostics,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).context("Chargement de la configuration")?,
        None => EngineConfig::default(),
    };
    let bundle = fit_bundle(&cli, config)?;

    match cli.command {
        Command::Predict {
            math,
            physics,
            literature,
            english,
            communication,
            teamwork,
            leadership,
            problem_solving,
            html,
        } => {
            let body = serde_json::json!({
                "math_score": math,
                "physics_score": physics,
                "literature_score": literature,
                "english_score": english,
                "communication": communication,
                "teamwork": teamwork,
                "leadership": leadership,
                "problem_solving": problem_solving,
            });
            let result = bundle.predict_student(&body)?;
            display_prediction(&result, html);
        }
        Command::Recommend { json, fields } => {
            let profile = build_profile(json.as_deref(), &fields)?;
            let details = bundle.get_recommendation_details(&profile)?;
            display_recommendation(&details);
        }
        Command::Stats => display_stats(&bundle.stats()),
        Command::Formations => display_formations(&bundle.formations()),
        Command::Clusters => display_clusters(&bundle),
        Command::Info => display_bundle_info(&bundle),
        #[cfg(feature = "diagnostics")]
        Command::Diagnostics => {
            match orienta_engine::diagnostics::fit_report(bundle.dataset(), bundle.config().seed)? {
                Some(r) => println!(
                    "Régression satisfaction : train={} test={} features={} MAE={:.4} R²={:.4}",
                    r.n_train, r.n_test, r.n_features, r.mae, r.r2
                ),
                None => println!("Pas de colonne satisfaction exploitable."),
            }
        }
    }
    Ok(())
}

fn fit_bundle(cli: &Cli, config: EngineConfig) -> Result<ModelBundle> {
    let path = match &cli.dataset {
        Some(path) => path.clone(),
        None => resolve_path(&cli.data_dir).context("Recherche du jeu de données")?,
    };
    let dataset = Dataset::load_csv(&path).with_context(|| format!("Lecture de {}", path.display()))?;
    log::info!("{} étudiants chargés depuis {}", dataset.len(), path.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Ajustement des modèles sur {} étudiants...", dataset.len()));

    let bundle = ModelBundle::fit(Arc::new(dataset), config).context("Ajustement des modèles");
    pb.finish_and_clear();
    bundle
}

/// Fusionne le JSON fourni et les champs `colonne=valeur`, ces derniers prenant le dessus.
fn build_profile(json: Option<&str>, fields: &[String]) -> Result<Value> {
    let mut profile = match json {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("Profil JSON invalide")? {
            Value::Object(map) => map,
            other => bail!("Le profil doit être un objet JSON, reçu: {}", other),
        },
        None => Map::new(),
    };

    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            bail!("Champ invalide '{}', attendu colonne=valeur", field);
        };
        profile.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }
    Ok(Value::Object(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_profile_merges_fields() {
        let fields = vec!["math_score=15".to_string(), "age = 19".to_string()];
        let profile = build_profile(Some(r#"{"math_score": 12, "teamwork": 6}"#), &fields).unwrap();
        assert_eq!(profile["math_score"], "15");
        assert_eq!(profile["age"], "19");
        assert_eq!(profile["teamwork"], 6);
    }

    #[test]
    fn test_build_profile_rejects_bad_input() {
        assert!(build_profile(Some("[1, 2]"), &[]).is_err());
        assert!(build_profile(None, &["math_score".to_string()]).is_err());
        assert_eq!(build_profile(None, &[]).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["orienta", "predict", "--math", "18", "--teamwork", "3"]).unwrap();
        match cli.command {
            Command::Predict { math, teamwork, physics, .. } => {
                assert_eq!(math, 18.0);
                assert_eq!(teamwork, 3.0);
                assert_eq!(physics, 0.0);
            }
            _ => panic!("commande inattendue"),
        }
    }
}
