mod error;
mod journal;
mod routes;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use orienta_data::dataset::{resolve_path, Dataset};
use orienta_engine::{EngineConfig, ModelBundle};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "orienta-server", about = "API de prédiction de niveau et de recommandation de formation")]
struct Args {
    #[arg(long, env = "ORIENTA_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "ORIENTA_PORT", default_value_t = 5000)]
    port: u16,

    /// Nombre de workers (défaut : un par cœur)
    #[arg(long, env = "ORIENTA_WORKERS")]
    workers: Option<usize>,

    /// Fichier CSV explicite
    #[arg(long, env = "ORIENTA_DATASET")]
    dataset: Option<PathBuf>,

    /// Répertoire où chercher etudiants.csv puis data/<repli>.csv
    #[arg(long, env = "ORIENTA_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Hyperparamètres au format JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).context("Chargement de la configuration")?,
        None => EngineConfig::default(),
    };

    let path = match &args.dataset {
        Some(path) => path.clone(),
        None => resolve_path(&args.data_dir).context("Recherche du jeu de données")?,
    };
    info!("Chargement du jeu de données: {}", path.display());
    let dataset = Dataset::load_csv(&path)
        .with_context(|| format!("Lecture de {}", path.display()))?;
    info!("{} étudiants, {} colonnes", dataset.len(), dataset.columns().len());

    // Tous les modèles sont prêts avant la première requête
    let models = Arc::new(
        ModelBundle::fit(Arc::new(dataset), config).context("Ajustement des modèles")?,
    );
    info!(
        "Formations connues: {} | features: {}",
        models.formation().classes().join(", "),
        models.formation().schema().columns().join(", ")
    );

    let state = web::Data::new(AppState::new(models));
    let bind_address = format!("{}:{}", args.host, args.port);
    info!("Serveur démarré sur: http://{}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(routes::configure)
    });
    if let Some(workers) = args.workers {
        info!("Workers: {}", workers);
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Impossible d'écouter sur {}", bind_address))?
        .run()
        .await
        .context("Arrêt du serveur")?;

    Ok(())
}
