use crate::error::{Error, Result};

/// Étiquettes texte ↔ indices de classe. Les classes sont triées, comme leurs indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| Error::InvalidInput(format!("classe inconnue: {}", label)))
    }

    pub fn decode(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| Error::Prediction(format!("indice de classe {} hors limites", index)))
    }
}
