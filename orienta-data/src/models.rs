use serde::{Deserialize, Serialize};

use crate::levels::{score_to_level, LevelLetter, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoftSkill {
    Communication,
    Teamwork,
    Leadership,
    ProblemSolving,
}

impl SoftSkill {
    pub const ALL: [SoftSkill; 4] = [
        SoftSkill::Communication,
        SoftSkill::Teamwork,
        SoftSkill::Leadership,
        SoftSkill::ProblemSolving,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            SoftSkill::Communication => "communication",
            SoftSkill::Teamwork => "teamwork",
            SoftSkill::Leadership => "leadership",
            SoftSkill::ProblemSolving => "problem_solving",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SoftSkill::Communication => "Communication",
            SoftSkill::Teamwork => "Travail en équipe",
            SoftSkill::Leadership => "Leadership",
            SoftSkill::ProblemSolving => "Résolution de problèmes",
        }
    }
}

/// Auto-évaluation des soft skills, échelle 0-10 par convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SoftSkillProfile {
    pub communication: f64,
    pub teamwork: f64,
    pub leadership: f64,
    pub problem_solving: f64,
}

impl SoftSkillProfile {
    pub fn new(communication: f64, teamwork: f64, leadership: f64, problem_solving: f64) -> Self {
        Self { communication, teamwork, leadership, problem_solving }
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.communication, self.teamwork, self.leadership, self.problem_solving]
    }

    pub fn get(&self, skill: SoftSkill) -> f64 {
        match skill {
            SoftSkill::Communication => self.communication,
            SoftSkill::Teamwork => self.teamwork,
            SoftSkill::Leadership => self.leadership,
            SoftSkill::ProblemSolving => self.problem_solving,
        }
    }
}

/// Une ligne du jeu de données. Les notes et lettres suivent l'ordre de `Subject::ALL`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentRecord {
    pub student_id: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub region: Option<String>,
    pub school_type: Option<String>,
    pub scores: [Option<f64>; 4],
    pub levels: [Option<LevelLetter>; 4],
    pub soft_skills: SoftSkillProfile,
    pub preferred_option: Option<String>,
    pub satisfaction: Option<f64>,
}

impl StudentRecord {
    pub fn score(&self, subject: Subject) -> Option<f64> {
        self.scores[subject_index(subject)]
    }

    /// Lettre par matière : niveau précalculé s'il existe, sinon dérivé de la note.
    pub fn subject_letters(&self) -> [LevelLetter; 4] {
        let mut letters = [LevelLetter::D; 4];
        for (i, letter) in letters.iter_mut().enumerate() {
            *letter = self.levels[i].unwrap_or_else(|| score_to_level(self.scores[i]));
        }
        letters
    }

    pub fn display_name(&self) -> String {
        format!("Étudiant {}", self.student_id.as_deref().unwrap_or(""))
    }
}

pub fn subject_index(subject: Subject) -> usize {
    match subject {
        Subject::Math => 0,
        Subject::Physics => 1,
        Subject::Literature => 2,
        Subject::English => 3,
    }
}
