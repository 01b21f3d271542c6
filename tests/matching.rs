//! Dictionary matching behavior across the public API.

use gradcheck::dictionary::{DictionaryKey, DictionaryRepository, DictionarySource};
use gradcheck::matching::{MatchStrategy, Matcher};
use gradcheck::models::DocumentType;
use tempfile::TempDir;

const DIPLOMA_TEXT: &str = "LA INSTITUCIÓN EDUCATIVA COLEGIO SAN JOSÉ confiere el título de \
BACHILLER ACADÉMICO a JUAN CARLOS PEREZ. Acta de grado No. 145, libro de registro folio 32. \
Secretaría de Educación de Bogotá.";

fn diploma_dictionary() -> Vec<&'static str> {
    vec![
        "bachiller académico",
        "acta de grado",
        "confiere el título",
        "institución educativa",
        "libro de registro",
        "secretaría de educación",
        "resolución de aprobación",
        "ministerio de educación nacional",
    ]
}

#[test]
fn test_accent_and_case_insensitive() {
    let matcher = Matcher::default();
    assert!(matcher.validate("la cedula es valida", &["cédula"], 1));
    assert!(matcher.validate("LA CEDULA", &["cedula"], 1));
}

#[test]
fn test_nit_on_small_dictionary() {
    let matcher = Matcher::default();
    let result = matcher.evaluate("NIT 860401734-9 pagado", &["860401734"], 1);
    assert!(result.is_valid);
    assert_eq!(result.strategy, MatchStrategy::Exact);
}

#[test]
fn test_monotonic_in_min_matches() {
    let matcher = Matcher::default();
    let dictionary = diploma_dictionary();

    let mut previous = true;
    for min in 1..=dictionary.len() + 2 {
        let valid = matcher.validate(DIPLOMA_TEXT, &dictionary, min);
        assert!(previous || !valid, "valid at {} after failing below", min);
        previous = valid;
    }
    assert!(matcher.validate(DIPLOMA_TEXT, &dictionary, 1));
}

#[test]
fn test_invariant_to_dictionary_order() {
    let matcher = Matcher::default();
    let forward = diploma_dictionary();
    let mut reversed = forward.clone();
    reversed.reverse();
    let mut rotated = forward.clone();
    rotated.rotate_left(3);

    for min in 1..=forward.len() {
        let expected = matcher.validate(DIPLOMA_TEXT, &forward, min);
        assert_eq!(matcher.validate(DIPLOMA_TEXT, &reversed, min), expected);
        assert_eq!(matcher.validate(DIPLOMA_TEXT, &rotated, min), expected);
    }
}

#[test]
fn test_unrelated_text_is_rejected() {
    let matcher = Matcher::default();
    let result = matcher.evaluate(
        "Factura de venta de repuestos para motocicleta",
        &diploma_dictionary(),
        1,
    );
    assert!(!result.is_valid);
    assert_eq!(result.match_count, 0);
}

#[test]
fn test_fallback_dictionary_still_validates() {
    // No dictionary files at all: built-in words stand in
    let dir = TempDir::new().unwrap();
    let repo = DictionaryRepository::new(dir.path());
    let set = repo.get(DocumentType::Cedula);
    assert_eq!(set.source, DictionarySource::Fallback);

    let matcher = Matcher::default();
    assert!(matcher.validate(
        "REPÚBLICA DE COLOMBIA CÉDULA DE CIUDADANÍA",
        &set.keywords,
        1
    ));
}

#[test]
fn test_bundled_dictionaries_load_from_files() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("dictionaries");
    let repo = DictionaryRepository::new(dir);

    assert_eq!(repo.preload(), DictionaryKey::ALL.len());
    for key in DictionaryKey::ALL {
        assert_eq!(repo.get(key).source, DictionarySource::File, "{}", key);
    }

    let institutions = repo.get(DictionaryKey::Institutions);
    assert!(Matcher::default().validate(
        "CORPORACION UNIFICADA NACIONAL DE EDUCACION SUPERIOR-CUN-BOGOTÁ D.C.",
        &institutions.keywords,
        1
    ));
}

#[test]
fn test_bundled_institutions_reject_names_containing_cun() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("dictionaries");
    let institutions = DictionaryRepository::new(dir).get(DictionaryKey::Institutions);
    let matcher = Matcher::default();

    for other in [
        "UNIVERSIDAD DE CUNDINAMARCA",
        "FUNDACION UNIVERSITARIA DEL AREA ANDINA - FACUNDO",
        "UNIVERSIDAD NACIONAL DE COLOMBIA",
    ] {
        assert!(
            !matcher.validate(other, &institutions.keywords, 1),
            "{} accepted",
            other
        );
    }

    assert!(matcher.validate(
        "Corporación Unificada Nacional (CUN)",
        &institutions.keywords,
        1
    ));
}
