use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::levels::{LevelLetter, Subject};
use crate::models::{SoftSkill, SoftSkillProfile, StudentRecord};

pub const PRIMARY_FILE: &str = "etudiants.csv";

pub const FALLBACK_FILES: &[&str] = &[
    "att.L2JHaz4Is_GMV7IkT1b-qO8ET7LOeLr8XgzQ-SmmWZ0.csv",
    "students.csv",
    "dataset.csv",
];

/// Valeurs lues comme manquantes, en plus de la cellule vide.
const MISSING_MARKERS: &[&str] = &["nan", "NaN", "NA", "N/A", "null", "None"];

/// Cherche `etudiants.csv` dans `dir`, puis les noms de repli dans `dir/data`.
pub fn resolve_path(dir: &Path) -> Result<PathBuf> {
    let primary = dir.join(PRIMARY_FILE);
    if primary.exists() {
        return Ok(primary);
    }

    let data_dir = dir.join("data");
    FALLBACK_FILES
        .iter()
        .map(|name| data_dir.join(name))
        .find(|p| p.exists())
        .ok_or_else(|| Error::NotFound { dir: dir.to_path_buf(), data_dir })
}

/// Nombre décimal, virgule française acceptée. `Ok(None)` pour une cellule manquante.
pub fn parse_decimal(s: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    let s = s.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return Ok(None);
    }
    let normalized = s.replace(',', ".");
    normalized.parse::<f64>().map(Some)
}

/// Table en lecture seule : colonnes nommées, cellules brutes, lignes typées.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
    records: Vec<StudentRecord>,
}

impl Dataset {
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = (0..columns.len())
                .map(|i| {
                    record
                        .get(i)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string())
                })
                .collect();
            rows.push(row);
        }

        Self::from_rows(columns, rows)
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        let mut dataset = Self { columns, index, rows, records: Vec::new() };
        dataset.records = (0..dataset.rows.len())
            .map(|row| dataset.parse_record(row))
            .collect::<Result<Vec<_>>>()?;
        Ok(dataset)
    }

    fn parse_record(&self, row: usize) -> Result<StudentRecord> {
        let text = |column: &str| self.text(row, column).map(|s| s.to_string());

        let mut scores = [None; 4];
        let mut levels = [None; 4];
        for (i, subject) in Subject::ALL.iter().enumerate() {
            scores[i] = self.number(row, subject.score_column())?;
            levels[i] = match self.text(row, subject.level_column()) {
                Some(raw) => Some(raw.parse::<LevelLetter>()?),
                None => None,
            };
        }

        let mut soft = [0.0; 4];
        for (i, skill) in SoftSkill::ALL.iter().enumerate() {
            soft[i] = self.number(row, skill.column())?.unwrap_or(0.0);
        }

        Ok(StudentRecord {
            student_id: text("student_id"),
            age: self.number(row, "age")?,
            gender: text("gender"),
            region: text("region"),
            school_type: text("school_type"),
            scores,
            levels,
            soft_skills: SoftSkillProfile::from_array(soft),
            preferred_option: text("preferred_option"),
            satisfaction: self.number(row, "satisfaction")?,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    /// Cellule brute, `None` si la colonne est absente ou la cellule vide.
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        let idx = *self.index.get(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Cellule numérique. Échoue sur une valeur non convertible, jamais de coercition silencieuse.
    pub fn number(&self, row: usize, column: &str) -> Result<Option<f64>> {
        match self.text(row, column) {
            None => Ok(None),
            Some(raw) => parse_decimal(raw).map_err(|_| Error::NotNumeric {
                column: column.to_string(),
                row: row + 1,
                value: raw.to_string(),
            }),
        }
    }

    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>> {
        if !self.has_column(column) {
            return Err(Error::MissingColumn(column.to_string()));
        }
        (0..self.len()).map(|row| self.number(row, column)).collect()
    }

    pub fn text_column(&self, column: &str) -> Result<Vec<Option<&str>>> {
        if !self.has_column(column) {
            return Err(Error::MissingColumn(column.to_string()));
        }
        Ok((0..self.len()).map(|row| self.text(row, column)).collect())
    }
}

const TEST_OPTIONS: [&str; 4] = ["Engineering", "Letters", "Economics", "IT"];

/// Jeu de données synthétique déterministe au format du CSV d'origine.
pub fn make_test_csv(n: usize) -> String {
    let letter = |score: usize| match score {
        s if s >= 16 => "A",
        s if s >= 12 => "B",
        s if s >= 8 => "C",
        _ => "D",
    };

    let mut out = String::from(
        "student_id,age,gender,region,school_type,math_score,physics_score,literature_score,english_score,\
         math_level,physics_level,literature_level,english_level,\
         communication,teamwork,leadership,problem_solving,parent_income,attendance_rate,preferred_option,satisfaction\n",
    );

    for i in 0..n {
        let math = (i * 7 + 4) % 21;
        let physics = (i * 11 + 3) % 21;
        let literature = (i * 5 + 8) % 21;
        let english = (i * 13 + 2) % 21;
        let communication = (i * 3) % 11;
        let teamwork = (i * 7 + 1) % 11;
        let leadership = (i * 5 + 2) % 11;
        let problem_solving = (i * 9 + 4) % 11;

        let option = if math + physics >= 26 {
            TEST_OPTIONS[0]
        } else if literature + english >= 26 {
            TEST_OPTIONS[1]
        } else if communication >= 6 {
            TEST_OPTIONS[2]
        } else {
            TEST_OPTIONS[3]
        };

        let satisfaction = 1 + (math + communication) % 5;

        out.push_str(&format!(
            "S{:03},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{:.2},{},{}\n",
            i,
            17 + i % 6,
            if i % 2 == 0 { "F" } else { "M" },
            ["Nord", "Sud", "Est", "Ouest"][i % 4],
            if i % 3 == 0 { "Public" } else { "Privé" },
            math,
            physics,
            literature,
            english,
            letter(math),
            letter(physics),
            letter(literature),
            letter(english),
            communication,
            teamwork,
            leadership,
            problem_solving,
            1000 + (i * 37 % 50) * 100,
            0.6 + (i % 40) as f64 / 100.0,
            option,
            satisfaction,
        ));
    }
    out
}

pub fn make_test_dataset(n: usize) -> Dataset {
    Dataset::from_reader(make_test_csv(n).as_bytes()).expect("jeu de test valide")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert!((parse_decimal("12,50").unwrap().unwrap() - 12.5).abs() < 1e-9);
        assert!((parse_decimal(" 7 ").unwrap().unwrap() - 7.0).abs() < 1e-9);
        assert_eq!(parse_decimal("").unwrap(), None);
        assert_eq!(parse_decimal("NaN").unwrap(), None);
        assert!(parse_decimal("douze").is_err());
    }

    #[test]
    fn test_load_test_dataset() {
        let ds = make_test_dataset(40);
        assert_eq!(ds.len(), 40);
        assert!(ds.has_column("preferred_option"));
        assert!(!ds.has_column("chemistry_score"));
        let first = &ds.records()[0];
        assert_eq!(first.student_id.as_deref(), Some("S000"));
        assert_eq!(first.score(Subject::Math), Some(4.0));
        assert_eq!(first.levels[0], Some(LevelLetter::D));
    }

    #[test]
    fn test_missing_soft_skills_default_to_zero() {
        let csv = "student_id,math_score,communication,teamwork\n1,12,,4\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        let soft = ds.records()[0].soft_skills;
        assert_eq!(soft.communication, 0.0);
        assert_eq!(soft.teamwork, 4.0);
        assert_eq!(soft.leadership, 0.0);
    }

    #[test]
    fn test_non_numeric_score_fails_loudly() {
        let csv = "student_id,math_score\n1,douze\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::NotNumeric { ref column, row: 1, .. } if column == "math_score"));
    }

    #[test]
    fn test_invalid_level_letter_fails() {
        let csv = "student_id,math_level\n1,E\n";
        assert!(matches!(Dataset::from_reader(csv.as_bytes()), Err(Error::InvalidLevel(_))));
    }

    #[test]
    fn test_numeric_column_missing() {
        let ds = make_test_dataset(5);
        assert!(matches!(ds.numeric_column("biology_score"), Err(Error::MissingColumn(_))));
        assert_eq!(ds.numeric_column("age").unwrap().len(), 5);
    }

    #[test]
    fn test_resolve_path_fallback() {
        let dir = std::env::temp_dir().join(format!("orienta_resolve_{}", std::process::id()));
        let data_dir = dir.join("data");
        std::fs::create_dir_all(&data_dir).unwrap();

        assert!(matches!(resolve_path(&dir), Err(Error::NotFound { .. })));

        std::fs::write(data_dir.join("students.csv"), make_test_csv(3)).unwrap();
        assert_eq!(resolve_path(&dir).unwrap(), data_dir.join("students.csv"));

        std::fs::write(dir.join(PRIMARY_FILE), make_test_csv(3)).unwrap();
        let resolved = resolve_path(&dir).unwrap();
        assert_eq!(resolved, dir.join(PRIMARY_FILE));
        assert_eq!(Dataset::load_csv(&resolved).unwrap().len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
