use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use orienta_engine::explore::DatasetStats;
use orienta_engine::formation::RecommendationDetails;
use orienta_engine::models::Classifier;
use orienta_engine::tier::PredictionResult;
use orienta_engine::ModelBundle;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn opt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{:.2}", v))
}

pub fn display_prediction(result: &PredictionResult, html: bool) {
    let mut table = new_table(vec!["Niveau prédit", "Cluster soft skills"]);
    table.add_row(vec![
        Cell::new(result.predicted_level.as_str()).fg(Color::Green),
        Cell::new(result.cluster_soft),
    ]);
    println!("{table}");
    println!();

    if html {
        println!("{}", result.recommendation);
    } else {
        println!("{}", result.details);
    }
}

pub fn display_recommendation(details: &RecommendationDetails) {
    println!("Formation recommandée : {}", details.recommended_option);
    println!("Cluster de performance : {}", details.cluster);
    println!("Cours suggérés : {}", details.recommended_courses.join(", "));
    println!();

    let mut probs: Vec<(&String, &f64)> = details.option_probabilities.iter().collect();
    probs.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut table = new_table(vec!["Formation", "Probabilité"]);
    for (option, p) in probs {
        let cell = Cell::new(format!("{:.2}", p));
        let cell = if *option == details.recommended_option { cell.fg(Color::Green) } else { cell };
        table.add_row(vec![Cell::new(option), cell]);
    }
    println!("{table}");

    if !details.similar_students.is_empty() {
        let mut table = new_table(vec!["Étudiant similaire", "Formation", "Distance"]);
        for s in &details.similar_students {
            table.add_row(vec![s.student_id.clone(), s.preferred_option.clone(), format!("{:.4}", s.distance)]);
        }
        println!("{table}");
    }

    let mut table = new_table(vec!["Feature", "Importance", "Valeur étudiant", "Moyenne"]);
    for f in &details.explanations.top_features {
        table.add_row(vec![
            f.name.clone(),
            format!("{:.4}", f.importance),
            format!("{:.2}", f.student_value),
            format!("{:.2}", f.dataset_mean),
        ]);
    }
    println!("{table}");
}

pub fn display_stats(stats: &DatasetStats) {
    println!("Étudiants  : {}", stats.total_students);
    println!("Formations : {}", stats.total_formations);
    println!();

    let avg = &stats.average_scores;
    let mut table = new_table(vec!["Math", "Physics", "Literature", "English"]);
    table.add_row(vec![
        opt_score(avg.math),
        opt_score(avg.physics),
        opt_score(avg.literature),
        opt_score(avg.english),
    ]);
    println!("Moyennes globales :");
    println!("{table}");

    if stats.formation_stats.is_empty() {
        return;
    }

    let mut table = new_table(vec!["Formation", "Effectif", "Math", "Physics", "Literature", "English"]);
    for f in &stats.formation_stats {
        table.add_row(vec![
            f.preferred_option.clone(),
            f.count.to_string(),
            opt_score(f.math_score),
            opt_score(f.physics_score),
            opt_score(f.literature_score),
            opt_score(f.english_score),
        ]);
    }
    println!("Par formation :");
    println!("{table}");
}

pub fn display_formations(formations: &[String]) {
    if formations.is_empty() {
        println!("Aucune formation dans le jeu de données.");
        return;
    }
    for f in formations {
        println!("  {}", f);
    }
}

pub fn display_clusters(bundle: &ModelBundle) {
    let mut table = new_table(vec!["Cluster soft", "Effectif", "Communication", "Équipe", "Leadership", "Résolution"]);
    for p in bundle.tier().cluster_profiles() {
        table.add_row(vec![
            p.cluster.to_string(),
            p.size.to_string(),
            format!("{:.2}", p.communication),
            format!("{:.2}", p.teamwork),
            format!("{:.2}", p.leadership),
            format!("{:.2}", p.problem_solving),
        ]);
    }
    println!("Clusters soft skills :");
    println!("{table}");

    let overview = bundle.exploration_overview();
    let mut table = new_table(vec!["Cluster performance", "Effectif", "Math", "Physics", "Literature", "English"]);
    for scores in &overview.avg_scores_by_cluster {
        let count = overview
            .cluster_counts
            .iter()
            .find(|c| c.cluster == scores.cluster)
            .map_or(0, |c| c.count);
        table.add_row(vec![
            scores.cluster.to_string(),
            count.to_string(),
            opt_score(scores.math_score),
            opt_score(scores.physics_score),
            opt_score(scores.literature_score),
            opt_score(scores.english_score),
        ]);
    }
    println!("Clusters de performance :");
    println!("{table}");
}

fn params_row(model: &dyn Classifier) -> Vec<String> {
    let mut params: Vec<(String, f64)> = model.params().into_iter().collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    let params = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    vec![model.name().to_string(), model.n_classes().to_string(), params]
}

pub fn display_bundle_info(bundle: &ModelBundle) {
    println!("Jeu de données : {} lignes, {} colonnes", bundle.dataset().len(), bundle.dataset().columns().len());
    println!();

    let mut table = new_table(vec!["Modèle", "Classes", "Paramètres"]);
    table.add_row(params_row(bundle.tier().classifier()));
    table.add_row(params_row(bundle.formation().forest()));
    let kmeans = bundle.tier().soft_kmeans();
    table.add_row(vec![
        "KMeans (soft skills)".to_string(),
        kmeans.n_clusters().to_string(),
        format!("inertia={:.3}, n_iter={}", kmeans.inertia(), kmeans.n_iter()),
    ]);
    println!("{table}");

    let mut table = new_table(vec!["Feature formation", "Médiane", "Importance"]);
    let formation = bundle.formation();
    let importances = formation.forest().feature_importances();
    for (i, column) in formation.schema().columns().iter().enumerate() {
        table.add_row(vec![
            column.clone(),
            format!("{:.2}", formation.medians()[i]),
            format!("{:.4}", importances[i]),
        ]);
    }
    println!("{table}");
    println!("Formations : {}", formation.classes().join(", "));
}
