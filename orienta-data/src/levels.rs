use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lettre de niveau par matière. L'ordre de déclaration porte l'ordre ordinal D < C < B < A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LevelLetter {
    D,
    C,
    B,
    A,
}

impl LevelLetter {
    pub const ALL: [LevelLetter; 4] = [LevelLetter::D, LevelLetter::C, LevelLetter::B, LevelLetter::A];

    pub fn encode(self) -> u8 {
        match self {
            LevelLetter::D => 0,
            LevelLetter::C => 1,
            LevelLetter::B => 2,
            LevelLetter::A => 3,
        }
    }

    pub fn decode(code: u8) -> Result<Self> {
        match code {
            0 => Ok(LevelLetter::D),
            1 => Ok(LevelLetter::C),
            2 => Ok(LevelLetter::B),
            3 => Ok(LevelLetter::A),
            other => Err(Error::InvalidLevelCode(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelLetter::D => "D",
            LevelLetter::C => "C",
            LevelLetter::B => "B",
            LevelLetter::A => "A",
        }
    }
}

impl FromStr for LevelLetter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(LevelLetter::A),
            "B" => Ok(LevelLetter::B),
            "C" => Ok(LevelLetter::C),
            "D" => Ok(LevelLetter::D),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LevelLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Niveau global d'un étudiant, Level 1 (le plus faible) à Level 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GlobalLevel {
    #[serde(rename = "Level 1")]
    Level1,
    #[serde(rename = "Level 2")]
    Level2,
    #[serde(rename = "Level 3")]
    Level3,
    #[serde(rename = "Level 4")]
    Level4,
}

impl GlobalLevel {
    /// Ordre des classes du classifieur (tri lexicographique des libellés).
    pub const ALL: [GlobalLevel; 4] = [
        GlobalLevel::Level1,
        GlobalLevel::Level2,
        GlobalLevel::Level3,
        GlobalLevel::Level4,
    ];

    pub fn from_letter(letter: LevelLetter) -> Self {
        match letter {
            LevelLetter::D => GlobalLevel::Level1,
            LevelLetter::C => GlobalLevel::Level2,
            LevelLetter::B => GlobalLevel::Level3,
            LevelLetter::A => GlobalLevel::Level4,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            GlobalLevel::Level1 => 0,
            GlobalLevel::Level2 => 1,
            GlobalLevel::Level3 => 2,
            GlobalLevel::Level4 => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalLevel::Level1 => "Level 1",
            GlobalLevel::Level2 => "Level 2",
            GlobalLevel::Level3 => "Level 3",
            GlobalLevel::Level4 => "Level 4",
        }
    }
}

impl fmt::Display for GlobalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Les quatre matières, dans l'ordre fixe utilisé pour le départage du vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Math,
    Physics,
    Literature,
    English,
}

impl Subject {
    pub const ALL: [Subject; 4] = [Subject::Math, Subject::Physics, Subject::Literature, Subject::English];

    pub fn score_column(&self) -> &'static str {
        match self {
            Subject::Math => "math_score",
            Subject::Physics => "physics_score",
            Subject::Literature => "literature_score",
            Subject::English => "english_score",
        }
    }

    pub fn level_column(&self) -> &'static str {
        match self {
            Subject::Math => "math_level",
            Subject::Physics => "physics_level",
            Subject::Literature => "literature_level",
            Subject::English => "english_level",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::Physics => "Physics",
            Subject::Literature => "Literature",
            Subject::English => "English",
        }
    }
}

/// Conversion d'une note sur 20 en lettre. Bornes inclusives : 16 → A, 12 → B, 8 → C.
pub fn score_to_level(score: Option<f64>) -> LevelLetter {
    match score {
        None => LevelLetter::D,
        Some(s) if s >= 16.0 => LevelLetter::A,
        Some(s) if s >= 12.0 => LevelLetter::B,
        Some(s) if s >= 8.0 => LevelLetter::C,
        Some(_) => LevelLetter::D,
    }
}

/// Lettre majoritaire des quatre matières. En cas d'égalité, la première lettre
/// atteignant le compte maximal dans l'ordre math, physics, literature, english l'emporte.
pub fn majority_letter(letters: &[LevelLetter; 4]) -> LevelLetter {
    let count = |letter: LevelLetter| letters.iter().filter(|&&l| l == letter).count();

    let mut best = letters[0];
    let mut best_count = count(best);
    for &letter in &letters[1..] {
        let c = count(letter);
        if c > best_count {
            best = letter;
            best_count = c;
        }
    }
    best
}

pub fn aggregate(letters: &[LevelLetter; 4]) -> GlobalLevel {
    GlobalLevel::from_letter(majority_letter(letters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use LevelLetter::*;

    #[test]
    fn test_encode_decode() {
        for letter in LevelLetter::ALL {
            assert_eq!(LevelLetter::decode(letter.encode()).unwrap(), letter);
        }
        assert_eq!(D.encode(), 0);
        assert_eq!(A.encode(), 3);
        assert!(LevelLetter::decode(4).is_err());
    }

    #[test]
    fn test_parse_letter() {
        assert_eq!("a".parse::<LevelLetter>().unwrap(), A);
        assert_eq!(" C ".parse::<LevelLetter>().unwrap(), C);
        assert!("E".parse::<LevelLetter>().is_err());
        assert!("".parse::<LevelLetter>().is_err());
    }

    #[test]
    fn test_ordinal_order() {
        assert!(D < C && C < B && B < A);
    }

    #[test]
    fn test_score_to_level_boundaries() {
        assert_eq!(score_to_level(Some(16.0)), A);
        assert_eq!(score_to_level(Some(12.0)), B);
        assert_eq!(score_to_level(Some(8.0)), C);
        assert_eq!(score_to_level(Some(7.0)), D);
        assert_eq!(score_to_level(Some(15.99)), B);
        assert_eq!(score_to_level(None), D);
    }

    #[test]
    fn test_score_within_tier_is_stable() {
        for s in [16.0, 17.5, 18.0, 19.9, 20.0] {
            assert_eq!(score_to_level(Some(s)), A, "score {}", s);
        }
    }

    #[test]
    fn test_aggregate_strict_majority() {
        assert_eq!(aggregate(&[B, B, B, D]), GlobalLevel::Level3);
        assert_eq!(aggregate(&[D, C, C, A]), GlobalLevel::Level2);
    }

    #[test]
    fn test_aggregate_tie_break_first_occurrence() {
        assert_eq!(aggregate(&[A, A, B, B]), GlobalLevel::Level4);
        assert_eq!(aggregate(&[B, B, A, A]), GlobalLevel::Level3);
        assert_eq!(aggregate(&[A, B, C, D]), GlobalLevel::Level4);
        assert_eq!(aggregate(&[D, A, B, C]), GlobalLevel::Level1);
        assert_eq!(aggregate(&[C, A, A, C]), GlobalLevel::Level2);
    }

    #[test]
    fn test_global_level_labels() {
        assert_eq!(GlobalLevel::Level4.to_string(), "Level 4");
        for (i, level) in GlobalLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
            assert_eq!(GlobalLevel::from_index(i), Some(*level));
        }
    }
}
