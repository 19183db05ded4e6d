use std::fmt;

use orienta_data::levels::{GlobalLevel, LevelLetter, Subject};
use orienta_data::models::{SoftSkill, SoftSkillProfile};
use serde::Serialize;

use crate::error::{Error, Result};

/// Seuil (inclus) sous lequel un soft skill est un axe d'amélioration.
pub const SOFT_WEAK_MAX: f64 = 4.0;
/// Seuil (inclus) à partir duquel un soft skill est une force.
pub const SOFT_STRONG_MIN: f64 = 8.0;

/// Les cinq clusters soft skills. Le sens de chaque id dépend de la graine du k-means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoftCluster {
    Communication,
    ProblemSolving,
    Leadership,
    Balanced,
    Collaborative,
}

impl SoftCluster {
    pub const ALL: [SoftCluster; 5] = [
        SoftCluster::Communication,
        SoftCluster::ProblemSolving,
        SoftCluster::Leadership,
        SoftCluster::Balanced,
        SoftCluster::Collaborative,
    ];

    pub fn id(&self) -> usize {
        match self {
            SoftCluster::Communication => 0,
            SoftCluster::ProblemSolving => 1,
            SoftCluster::Leadership => 2,
            SoftCluster::Balanced => 3,
            SoftCluster::Collaborative => 4,
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            SoftCluster::Communication => {
                "Développer la communication via des ateliers interactifs et exercices d’expression orale."
            }
            SoftCluster::ProblemSolving => "Renforcer la résolution de problèmes à travers des cas pratiques.",
            SoftCluster::Leadership => "Stimuler le leadership grâce à des mini-projets.",
            SoftCluster::Balanced => "Renforcer progressivement tous les soft skills pour un profil équilibré.",
            SoftCluster::Collaborative => {
                "Consolider leadership et communication tout en valorisant l’esprit collaboratif."
            }
        }
    }
}

impl TryFrom<usize> for SoftCluster {
    type Error = Error;

    fn try_from(id: usize) -> Result<Self> {
        Self::ALL.get(id).copied().ok_or(Error::UnknownCluster(id))
    }
}

pub fn diagnosis(level: GlobalLevel) -> &'static str {
    match level {
        GlobalLevel::Level4 => "L’étudiant présente un excellent niveau global avec une maîtrise avancée.",
        GlobalLevel::Level3 => "L’étudiant possède un niveau satisfaisant avec un bon potentiel d’évolution.",
        GlobalLevel::Level2 => "L’étudiant présente un niveau moyen nécessitant un accompagnement ciblé.",
        GlobalLevel::Level1 => "Le niveau global est faible. Un plan de renforcement structuré est recommandé.",
    }
}

/// Plan d'action en quatre étapes, une par semaine.
pub fn action_plan(level: GlobalLevel) -> [&'static str; 4] {
    match level {
        GlobalLevel::Level4 => [
            "Maintenir les performances avec un suivi bi-hebdomadaire.",
            "Participer à des ateliers avancés pour approfondir les compétences clés.",
            "Encadrer ou aider d'autres étudiants pour renforcer leadership et communication.",
            "Fixer un objectif personnel d'excellence académique.",
        ],
        GlobalLevel::Level3 => [
            "Renforcer les matières légèrement en dessous du niveau A.",
            "Effectuer un mini-projet hebdomadaire pour renforcer la compréhension.",
            "Participer à des activités collaboratives pour améliorer le travail en équipe.",
            "Définir 2 objectifs de progression mesurables.",
        ],
        GlobalLevel::Level2 => [
            "Suivre un module de remise à niveau dans les matières faibles.",
            "Pratiquer des exercices supplémentaires chaque semaine.",
            "Participer à des sessions de tutorat ou groupes d’étude.",
            "Fixer 3 objectifs mesurables et suivre leur évolution.",
        ],
        GlobalLevel::Level1 => [
            "Suivre un programme intensif de renforcement (4 semaines).",
            "Faire un suivi hebdomadaire avec un formateur.",
            "Participer à des ateliers obligatoires en soft skills.",
            "Revoir les fondamentaux dans chaque matière identifiée comme faible.",
        ],
    }
}

/// Recommandation structurée : diagnostic, forces, axes d'amélioration, conseil du cluster, plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub level: GlobalLevel,
    pub cluster: SoftCluster,
    pub diagnosis: &'static str,
    pub strengths: Vec<&'static str>,
    pub soft_strengths: Vec<&'static str>,
    pub weaknesses: Vec<&'static str>,
    pub soft_weaknesses: Vec<&'static str>,
    pub cluster_advice: &'static str,
    pub action_plan: [&'static str; 4],
}

impl Recommendation {
    /// Fonction pure des niveaux, du cluster et des soft skills. Échoue sur un id de cluster hors 0..5.
    pub fn compose(
        level: GlobalLevel,
        cluster_id: usize,
        letters: &[LevelLetter; 4],
        soft: &SoftSkillProfile,
    ) -> Result<Self> {
        let cluster = SoftCluster::try_from(cluster_id)?;

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for (subject, letter) in Subject::ALL.iter().zip(letters) {
            match letter {
                LevelLetter::C | LevelLetter::D => weaknesses.push(subject.label()),
                LevelLetter::A => strengths.push(subject.label()),
                LevelLetter::B => {}
            }
        }

        let soft_weaknesses = SoftSkill::ALL
            .iter()
            .filter(|s| soft.get(**s) <= SOFT_WEAK_MAX)
            .map(|s| s.label())
            .collect();
        let soft_strengths = SoftSkill::ALL
            .iter()
            .filter(|s| soft.get(**s) >= SOFT_STRONG_MIN)
            .map(|s| s.label())
            .collect();

        Ok(Self {
            level,
            cluster,
            diagnosis: diagnosis(level),
            strengths,
            soft_strengths,
            weaknesses,
            soft_weaknesses,
            cluster_advice: cluster.advice(),
            action_plan: action_plan(level),
        })
    }

    pub fn all_strengths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strengths.iter().chain(&self.soft_strengths).copied()
    }

    pub fn all_weaknesses(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.weaknesses.iter().chain(&self.soft_weaknesses).copied()
    }

    /// Bloc HTML inséré tel quel par le frontend.
    pub fn to_html(&self) -> String {
        let items = |values: &[&str]| -> String {
            values.iter().map(|v| format!("<li>{}</li>", v)).collect()
        };

        let subject_strengths = if self.strengths.is_empty() {
            "<li>Aucune force notable détectée.</li>".to_string()
        } else {
            items(self.strengths.as_slice())
        };

        format!(
            "<div class='reco-block'>\n\
             <h5>📘 Diagnostic général — <span class='text-primary'>{level}</span></h5>\n\
             <p>{diagnosis}</p>\n\
             <hr>\n\
             <h6>🟢 Forces identifiées</h6>\n\
             <ul>{strengths}{soft_strengths}</ul>\n\
             <h6>🔴 Axes d'amélioration</h6>\n\
             <ul>{weaknesses}{soft_weaknesses}</ul>\n\
             <h6>📌 Recommandation personnalisée (Cluster {cluster})</h6>\n\
             <p>{advice}</p>\n\
             <h6>🎯 Plan d’action (4 semaines)</h6>\n\
             <ol>{plan}</ol>\n\
             </div>",
            level = self.level,
            diagnosis = self.diagnosis,
            strengths = subject_strengths,
            soft_strengths = items(self.soft_strengths.as_slice()),
            weaknesses = items(self.weaknesses.as_slice()),
            soft_weaknesses = items(self.soft_weaknesses.as_slice()),
            cluster = self.cluster.id(),
            advice = self.cluster_advice,
            plan = items(&self.action_plan[..]),
        )
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostic général ({})", self.level)?;
        writeln!(f, "  {}", self.diagnosis)?;

        writeln!(f, "Forces identifiées")?;
        if self.strengths.is_empty() {
            writeln!(f, "  - Aucune force notable détectée.")?;
        }
        for s in self.all_strengths() {
            writeln!(f, "  - {}", s)?;
        }

        writeln!(f, "Axes d'amélioration")?;
        for w in self.all_weaknesses() {
            writeln!(f, "  - {}", w)?;
        }

        writeln!(f, "Recommandation personnalisée (Cluster {})", self.cluster.id())?;
        writeln!(f, "  {}", self.cluster_advice)?;

        writeln!(f, "Plan d’action (4 semaines)")?;
        for (i, step) in self.action_plan.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, step)?;
        }
        Ok(())
    }
}
