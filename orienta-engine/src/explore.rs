//! Vues en lecture seule sur le jeu de données (exploration du frontend).

use std::collections::BTreeMap;

use orienta_data::dataset::Dataset;
use orienta_data::levels::Subject;
use orienta_data::models::StudentRecord;
use serde::Serialize;

use crate::formation::{PerformanceCluster, UNKNOWN_OPTION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageScores {
    pub math: Option<f64>,
    pub physics: Option<f64>,
    pub literature: Option<f64>,
    pub english: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationStat {
    pub preferred_option: String,
    pub count: usize,
    pub math_score: Option<f64>,
    pub physics_score: Option<f64>,
    pub literature_score: Option<f64>,
    pub english_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_students: usize,
    pub total_formations: usize,
    pub average_scores: AverageScores,
    pub formation_stats: Vec<FormationStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student_id: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub region: Option<String>,
    pub school_type: Option<String>,
    pub math_score: Option<f64>,
    pub physics_score: Option<f64>,
    pub literature_score: Option<f64>,
    pub english_score: Option<f64>,
    pub preferred_option: Option<String>,
}

impl From<&StudentRecord> for StudentSummary {
    fn from(r: &StudentRecord) -> Self {
        Self {
            student_id: r.student_id.clone(),
            age: r.age,
            gender: r.gender.clone(),
            region: r.region.clone(),
            school_type: r.school_type.clone(),
            math_score: r.score(Subject::Math),
            physics_score: r.score(Subject::Physics),
            literature_score: r.score(Subject::Literature),
            english_score: r.score(Subject::English),
            preferred_option: r.preferred_option.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRow {
    #[serde(flatten)]
    pub summary: StudentSummary,
    pub student_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteredStudent {
    #[serde(flatten)]
    pub summary: StudentSummary,
    pub cluster: PerformanceCluster,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteredStudents {
    pub counts: BTreeMap<String, usize>,
    pub students: Vec<ClusteredStudent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCount {
    pub preferred_option: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterCount {
    pub cluster: PerformanceCluster,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterScores {
    pub cluster: PerformanceCluster,
    pub math_score: Option<f64>,
    pub physics_score: Option<f64>,
    pub literature_score: Option<f64>,
    pub english_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationOverview {
    pub formations: Vec<String>,
    pub option_counts: Vec<OptionCount>,
    pub cluster_counts: Vec<ClusterCount>,
    pub avg_scores_by_cluster: Vec<ClusterScores>,
}

/// Filières distinctes non vides, dans l'ordre de première apparition.
pub fn formations(dataset: &Dataset) -> Vec<String> {
    let mut seen = Vec::new();
    for option in dataset.records().iter().filter_map(|r| r.preferred_option.as_deref()) {
        if !seen.iter().any(|s: &String| s == option) {
            seen.push(option.to_string());
        }
    }
    seen
}

pub fn stats(dataset: &Dataset) -> DatasetStats {
    let records = dataset.records();
    let subject_mean = |subject: Subject, rows: &[&StudentRecord]| mean(rows.iter().map(|r| r.score(subject)));

    let all: Vec<&StudentRecord> = records.iter().collect();
    let average_scores = AverageScores {
        math: subject_mean(Subject::Math, all.as_slice()),
        physics: subject_mean(Subject::Physics, all.as_slice()),
        literature: subject_mean(Subject::Literature, all.as_slice()),
        english: subject_mean(Subject::English, all.as_slice()),
    };

    let mut groups: BTreeMap<&str, Vec<&StudentRecord>> = BTreeMap::new();
    for record in records {
        if let Some(option) = record.preferred_option.as_deref() {
            groups.entry(option).or_default().push(record);
        }
    }

    let formation_stats = groups
        .iter()
        .map(|(option, rows)| FormationStat {
            preferred_option: option.to_string(),
            count: rows.len(),
            math_score: subject_mean(Subject::Math, rows.as_slice()),
            physics_score: subject_mean(Subject::Physics, rows.as_slice()),
            literature_score: subject_mean(Subject::Literature, rows.as_slice()),
            english_score: subject_mean(Subject::English, rows.as_slice()),
        })
        .collect();

    DatasetStats {
        total_students: records.len(),
        total_formations: groups.len(),
        average_scores,
        formation_stats,
    }
}

pub fn students(dataset: &Dataset) -> Vec<StudentRow> {
    dataset
        .records()
        .iter()
        .map(|r| StudentRow { summary: StudentSummary::from(r), student_name: r.display_name() })
        .collect()
}

/// `assignments[i]` est le cluster de performance de la ligne `i`.
pub fn clustered_students(dataset: &Dataset, assignments: &[PerformanceCluster]) -> ClusteredStudents {
    let students: Vec<ClusteredStudent> = dataset
        .records()
        .iter()
        .zip(assignments)
        .map(|(r, &cluster)| ClusteredStudent { summary: StudentSummary::from(r), cluster })
        .collect();

    let mut counts = BTreeMap::new();
    for s in &students {
        *counts.entry(s.cluster.to_string()).or_insert(0) += 1;
    }

    ClusteredStudents { counts, students }
}

pub fn exploration_overview(dataset: &Dataset, assignments: &[PerformanceCluster]) -> ExplorationOverview {
    let records = dataset.records();

    // Effectifs par filière : décroissants, égalités dans l'ordre de première apparition
    let mut option_counts: Vec<OptionCount> = Vec::new();
    for record in records {
        let option = record.preferred_option.as_deref().unwrap_or(UNKNOWN_OPTION);
        match option_counts.iter_mut().find(|c| c.preferred_option == option) {
            Some(c) => c.count += 1,
            None => option_counts.push(OptionCount { preferred_option: option.to_string(), count: 1 }),
        }
    }
    option_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let mut cluster_counts: Vec<ClusterCount> = PerformanceCluster::ALL
        .iter()
        .map(|&cluster| ClusterCount {
            cluster,
            count: assignments.iter().filter(|&&a| a == cluster).count(),
        })
        .filter(|c| c.count > 0)
        .collect();
    cluster_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let avg_scores_by_cluster = PerformanceCluster::ALL
        .iter()
        .filter_map(|&cluster| {
            let rows: Vec<&StudentRecord> = records
                .iter()
                .zip(assignments)
                .filter(|(_, a)| **a == cluster)
                .map(|(r, _)| r)
                .collect();
            if rows.is_empty() {
                return None;
            }
            let m = |subject: Subject| mean(rows.iter().map(|r| r.score(subject)));
            Some(ClusterScores {
                cluster,
                math_score: m(Subject::Math),
                physics_score: m(Subject::Physics),
                literature_score: m(Subject::Literature),
                english_score: m(Subject::English),
            })
        })
        .collect();

    ExplorationOverview {
        formations: formations(dataset),
        option_counts,
        cluster_counts,
        avg_scores_by_cluster,
    }
}

/// Moyenne des valeurs présentes, `None` s'il n'y en a aucune.
fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values.flatten().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PerformanceCluster::*;

    fn small() -> Dataset {
        let csv = "\
student_id,age,gender,region,school_type,math_score,physics_score,literature_score,english_score,preferred_option
1,18,F,Nord,Public,10,12,14,16,IT
2,19,M,Sud,Privé,14,,10,12,Arts
3,20,F,Est,Public,18,16,8,6,IT
4,17,M,Ouest,Public,6,8,12,10,
";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_formations_first_seen_order() {
        assert_eq!(formations(&small()), vec!["IT", "Arts"]);
    }

    #[test]
    fn test_stats() {
        let stats = stats(&small());
        assert_eq!(stats.total_students, 4);
        assert_eq!(stats.total_formations, 2);
        assert_eq!(stats.average_scores.math, Some(12.0));
        // Valeur manquante ignorée dans la moyenne
        assert_eq!(stats.average_scores.physics, Some(12.0));

        let it = stats.formation_stats.iter().find(|f| f.preferred_option == "IT").unwrap();
        assert_eq!(it.count, 2);
        assert_eq!(it.math_score, Some(14.0));
        assert_eq!(stats.formation_stats[0].preferred_option, "Arts");
    }

    #[test]
    fn test_students_have_display_name() {
        let rows = students(&small());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].student_name, "Étudiant 2");
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["student_id"], "1");
        assert_eq!(json["student_name"], "Étudiant 1");
        assert_eq!(json["math_score"], 10.0);
    }

    #[test]
    fn test_clustered_students_counts() {
        let clustered = clustered_students(&small(), &[Faible, Excellent, Excellent, Moyen]);
        assert_eq!(clustered.students.len(), 4);
        assert_eq!(clustered.counts["excellent"], 2);
        assert_eq!(clustered.counts["faible"], 1);
        let json = serde_json::to_value(&clustered.students[1]).unwrap();
        assert_eq!(json["cluster"], "excellent");
        assert_eq!(json["preferred_option"], "Arts");
    }

    #[test]
    fn test_exploration_overview() {
        let overview = exploration_overview(&small(), &[Faible, Excellent, Excellent, Moyen]);
        assert_eq!(overview.formations, vec!["IT", "Arts"]);

        let options: Vec<(&str, usize)> = overview
            .option_counts
            .iter()
            .map(|c| (c.preferred_option.as_str(), c.count))
            .collect();
        assert_eq!(options, vec![("IT", 2), ("Arts", 1), ("Unknown", 1)]);

        assert_eq!(overview.cluster_counts[0], ClusterCount { cluster: Excellent, count: 2 });
        assert_eq!(overview.cluster_counts.len(), 3);

        let excellent = overview
            .avg_scores_by_cluster
            .iter()
            .find(|c| c.cluster == Excellent)
            .unwrap();
        assert_eq!(excellent.math_score, Some(16.0));
        assert_eq!(excellent.physics_score, Some(16.0));
    }
}
