//! Applicant-submitted request fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request keys copied into the output record, paired with their output keys.
pub mod keys {
    pub const ID: &str = "ID";
    pub const FULL_NAME: &str = "Nombre_completo";
    pub const ID_TYPE: &str = "Tipo_de_documento";
    pub const ID_NUMBER: &str = "Numero_de_Documento";
    pub const MODALITY: &str = "Modalidad";
    pub const LEVEL: &str = "Nivel_de_formacion_del_cual_esta_solicitando_grado";
    pub const PROGRAM: &str = "Programa_del_cual_esta_solicitando_grado";
    pub const INSTITUTIONAL_EMAIL: &str = "Correo_electronico_institucional";
    pub const PERSONAL_EMAIL: &str = "Correo_electronico_personal";
    pub const DATA_CONSENT: &str = "Autorizacion_tratamiento_de_datos";
}

/// Flat key/value applicant data.
///
/// Values arrive from a form export, so they may be strings, numbers,
/// booleans or null. Everything is read back as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestFields(Map<String, Value>);

impl RequestFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and tooling.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Get a field as text. Missing and null values read as an empty string.
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Get a field only if it holds a non-empty string.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RequestFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_stringifies_values() {
        let fields: RequestFields = serde_json::from_str(
            r#"{"ID": 42, "Nombre_completo": "Ana Pérez", "Autorizacion_tratamiento_de_datos": true, "Modalidad": null}"#,
        )
        .unwrap();

        assert_eq!(fields.text(keys::ID), "42");
        assert_eq!(fields.text(keys::FULL_NAME), "Ana Pérez");
        assert_eq!(fields.text(keys::DATA_CONSENT), "true");
        assert_eq!(fields.text(keys::MODALITY), "");
        assert_eq!(fields.text("missing"), "");
    }

    #[test]
    fn test_str_value_skips_blank() {
        let fields = RequestFields::new().with("a", "  ").with("b", "x").with("c", 3);
        assert_eq!(fields.str_value("a"), None);
        assert_eq!(fields.str_value("b"), Some("x"));
        assert_eq!(fields.str_value("c"), None);
    }
}
