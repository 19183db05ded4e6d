//! Lecture des champs numériques d'une requête JSON.
//!
//! Deux règles coexistent : le classifieur de niveau attend des valeurs
//! complètes (champ absent → valeur par défaut, `null` refusé), le
//! recommandeur de formation accepte des profils partiels (absent ou
//! `null` → valeur imputée plus tard).

use orienta_data::dataset::parse_decimal;
use serde_json::Value;

use crate::error::{Error, Result};

/// Nombre JSON ou chaîne numérique. `Ok(None)` pour `null` ou une chaîne vide.
pub fn json_number(value: &Value, field: &str) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("{}: nombre non représentable", field))),
        Value::String(s) => parse_decimal(s)
            .map_err(|_| Error::InvalidInput(format!("{}: valeur non numérique '{}'", field, s))),
        other => Err(Error::InvalidInput(format!(
            "{}: nombre attendu, reçu {}",
            field, other
        ))),
    }
}

pub fn require_object<'a>(body: &'a Value) -> Result<&'a serde_json::Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| Error::InvalidInput("objet JSON attendu".to_string()))
}

/// Champ obligatoire avec valeur par défaut s'il est absent.
pub fn number_or_default(body: &Value, field: &str, default: f64) -> Result<f64> {
    let object = require_object(body)?;
    match object.get(field) {
        None => Ok(default),
        Some(value) => json_number(value, field)?
            .ok_or_else(|| Error::InvalidInput(format!("{}: valeur manquante", field))),
    }
}

/// Champ facultatif : absent, `null` ou vide → `None`.
pub fn optional_number(body: &Value, field: &str) -> Result<Option<f64>> {
    let object = require_object(body)?;
    match object.get(field) {
        None => Ok(None),
        Some(value) => json_number(value, field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_number_accepts_numbers_and_strings() {
        assert_eq!(json_number(&json!(12), "x").unwrap(), Some(12.0));
        assert_eq!(json_number(&json!(12.5), "x").unwrap(), Some(12.5));
        assert_eq!(json_number(&json!("14"), "x").unwrap(), Some(14.0));
        assert_eq!(json_number(&json!("13,5"), "x").unwrap(), Some(13.5));
        assert_eq!(json_number(&json!(null), "x").unwrap(), None);
    }

    #[test]
    fn test_json_number_rejects_garbage() {
        assert!(matches!(json_number(&json!("abc"), "x"), Err(Error::InvalidInput(_))));
        assert!(matches!(json_number(&json!(true), "x"), Err(Error::InvalidInput(_))));
        assert!(matches!(json_number(&json!([1]), "x"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_number_or_default() {
        let body = json!({"math_score": "15", "teamwork": null});
        assert_eq!(number_or_default(&body, "math_score", 0.0).unwrap(), 15.0);
        assert_eq!(number_or_default(&body, "physics_score", 0.0).unwrap(), 0.0);
        assert!(number_or_default(&body, "teamwork", 0.0).is_err());
    }

    #[test]
    fn test_optional_number() {
        let body = json!({"age": 19, "parent_income": null});
        assert_eq!(optional_number(&body, "age").unwrap(), Some(19.0));
        assert_eq!(optional_number(&body, "parent_income").unwrap(), None);
        assert_eq!(optional_number(&body, "attendance_rate").unwrap(), None);
    }

    #[test]
    fn test_body_must_be_object() {
        assert!(optional_number(&json!([1, 2]), "age").is_err());
        assert!(number_or_default(&json!("texte"), "age", 0.0).is_err());
    }
}
