//! Pattern families for the TyT fields.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::TytField;

/// How a [`FieldPattern`] finds its candidate value.
#[derive(Debug, Clone)]
pub enum PatternStrategy {
    /// First match of the regex; capture group 1 is the value.
    Capture(Regex),
    /// First `token` match starting within `window` chars of the `label` match.
    NearLabel {
        label: Regex,
        token: Regex,
        window: usize,
    },
    /// First match of the regex anywhere; the whole match is the value.
    FirstToken(Regex),
    /// Closed vocabulary, longest entry first; yields the canonical spelling.
    Catalog(Vec<CatalogEntry>),
}

/// One entry of a catalog strategy.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub pattern: Regex,
    pub canonical: String,
}

/// A named way of extracting one field.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub name: &'static str,
    /// Lower runs first.
    pub priority: u8,
    pub strategy: PatternStrategy,
}

impl FieldPattern {
    /// Capture-group pattern from a built-in regex. Panics on an invalid pattern.
    pub(crate) fn capture(name: &'static str, priority: u8, pattern: &str) -> Self {
        Self {
            name,
            priority,
            strategy: PatternStrategy::Capture(Regex::new(pattern).unwrap()),
        }
    }

    /// Raw candidate for this pattern, before post-processing.
    pub fn find<'t>(&self, text: &'t str) -> Option<std::borrow::Cow<'t, str>> {
        use std::borrow::Cow;

        match &self.strategy {
            PatternStrategy::Capture(re) => re
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| Cow::Borrowed(m.as_str())),
            PatternStrategy::NearLabel {
                label,
                token,
                window,
            } => {
                let start = label.find(text)?.start();
                let tail = &text[start..];
                let limit = tail
                    .char_indices()
                    .nth(*window)
                    .map(|(i, _)| i)
                    .unwrap_or(tail.len());
                token
                    .find(tail)
                    .filter(|m| m.start() < limit)
                    .map(|m| Cow::Borrowed(m.as_str()))
            }
            PatternStrategy::FirstToken(re) => re.find(text).map(|m| Cow::Borrowed(m.as_str())),
            PatternStrategy::Catalog(entries) => entries
                .iter()
                .find(|e| e.pattern.is_match(text))
                .map(|e| Cow::Owned(e.canonical.clone())),
        }
    }
}

/// 6 to 12 digits, or dotted thousands such as `1.234.567`.
const ID_NUMBER: &str = r"(\d{1,3}(?:\.\d{3}){1,3}|\d{6,12})\b";
const EK_CODE: &str = r"(EK\s*\d{10,15})\b";
const DATE: &str = r"\d{1,2}/\d{1,2}/\d{4}";

pub(super) static DEFAULT_PATTERNS: LazyLock<Vec<(TytField, Vec<FieldPattern>)>> =
    LazyLock::new(|| {
        vec![
            (
                TytField::IdentityNumber,
                vec![
                    FieldPattern::capture(
                        "identificacion_cc",
                        10,
                        &format!(r"(?i)Identificaci[oó0]n\s*:?\s*C\.\s?C\.?\s*:?\s*{ID_NUMBER}"),
                    ),
                    FieldPattern::capture(
                        "identificacion",
                        20,
                        &format!(r"(?i)Identificaci[oó0]n\s*:\s*{ID_NUMBER}"),
                    ),
                    FieldPattern::capture(
                        "cc_label",
                        30,
                        &format!(r"(?i)\bC\.\s?C\.\s*:?\s*{ID_NUMBER}"),
                    ),
                    FieldPattern::capture(
                        "cedula_label",
                        40,
                        &format!(
                            r"(?i)c[eé]dula(?:\s+de\s+ciudadan[ií]a)?\s*(?:No\.?|N[uú]mero|#)?\s*:?\s*{ID_NUMBER}"
                        ),
                    ),
                    FieldPattern::capture(
                        "documento_label",
                        50,
                        &format!(
                            r"(?i)Documento(?:\s+de\s+identidad)?\s*(?:No\.?|N[uú]mero|#)?\s*:?\s*{ID_NUMBER}"
                        ),
                    ),
                ],
            ),
            (
                TytField::RegistrationCode,
                vec![
                    FieldPattern::capture(
                        "numero_de_registro",
                        10,
                        &format!(r"(?i)N[uú]mero\s+de\s+registro\s*:?\s*{EK_CODE}"),
                    ),
                    FieldPattern::capture(
                        "registro_label",
                        20,
                        &format!(r"(?i)registro\s*:?\s*{EK_CODE}"),
                    ),
                    FieldPattern::capture("ek_code", 30, r"(?i)\b(EK\d{10,15})\b"),
                ],
            ),
            (
                TytField::Institution,
                vec![
                    FieldPattern::capture(
                        "ies_label_multiline",
                        10,
                        r"(?is)Instituci[oó]n\s+de\s+educaci[oó]n\s+superior\s*:\s*(.+?)\n\s*Programa",
                    ),
                    FieldPattern::capture(
                        "ies_label",
                        20,
                        r"(?im)Instituci[oó]n\s+de\s+educaci[oó]n\s+superior\s*:\s*([^\n\r]+?)\s*(?:Programa|Educaci[oó]n\s+Superior|$)",
                    ),
                    FieldPattern::capture(
                        "educacion_superior_label",
                        30,
                        r"(?im)educaci[oó]n\s+superior\s*:\s*([^\n\r]+?)\s*(?:Programa|$)",
                    ),
                    FieldPattern::capture(
                        "cun_name",
                        40,
                        r"(?im)(Corporaci[oó]n\s+Unificada\s+Nacional[^\n\r]*?)\s*(?:Programa|$)",
                    ),
                ],
            ),
            (
                TytField::Program,
                vec![
                    FieldPattern::capture(
                        "programa_academico",
                        10,
                        r"(?im)Programa\s+Acad[eé]mico\s*:[ \t]*([^\n\r]+?)\s*(?:2\.|Reporte|$)",
                    ),
                    FieldPattern::capture(
                        "programa_academico_next_line",
                        20,
                        r"(?im)Programa\s+Acad[eé]mico\s*:[ \t]*\r?\n\s*([^\n\r]+?)\s*(?:2\.|$)",
                    ),
                    FieldPattern::capture(
                        "programa_academico_long",
                        30,
                        r"(?i)Programa\s+Acad[eé]mico\s*:?\s*([^\n\r]{10,})",
                    ),
                    FieldPattern::capture(
                        "tecnico_profesional",
                        40,
                        r"(?im)(T[eé]cnico\s+Profesional\s+[^\n\r]+?)\s*(?:2\.|$)",
                    ),
                    FieldPattern::capture(
                        "tecnologia_en",
                        50,
                        r"(?im)(Tecnolog[ií]a\s+en\s+[^\n\r]+?)\s*(?:2\.|$)",
                    ),
                ],
            ),
            (
                TytField::PresentationDate,
                vec![
                    FieldPattern::capture(
                        "aplicacion_del_examen",
                        10,
                        &format!(r"(?i)Aplicaci[oó]n\s+del\s+examen\s*:\s*({DATE})"),
                    ),
                    FieldPattern::capture(
                        "aplicacion_label",
                        20,
                        &format!(r"(?i)Aplicaci[oó]n[^:\n]*:\s*({DATE})"),
                    ),
                    FieldPattern {
                        name: "near_aplicacion",
                        priority: 30,
                        strategy: PatternStrategy::NearLabel {
                            label: Regex::new(r"(?i)Aplicaci[oó]n\s+del\s+examen").unwrap(),
                            token: Regex::new(&format!(r"\b{DATE}\b")).unwrap(),
                            window: 100,
                        },
                    },
                    FieldPattern {
                        name: "first_date",
                        priority: 40,
                        strategy: PatternStrategy::FirstToken(
                            Regex::new(&format!(r"\b{DATE}\b")).unwrap(),
                        ),
                    },
                ],
            ),
        ]
    });

static TRAILING_NUMERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\d+\.\s*$").unwrap());
static EK_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^EK\d{10,15}$").unwrap());

/// Minimum length (exclusive) of institution and program names.
const MIN_NAME_CHARS: usize = 10;

/// Clean a raw candidate; `None` rejects it so the next pattern is tried.
pub(super) fn post_process(field: TytField, raw: &str) -> Option<String> {
    let value = match field {
        TytField::IdentityNumber => {
            let digits: String = raw.chars().filter(|c| !matches!(c, '.' | ' ')).collect();
            let len = digits.len();
            if !digits.chars().all(|c| c.is_ascii_digit()) || !(6..=12).contains(&len) {
                return None;
            }
            digits
        }
        TytField::RegistrationCode => {
            let code: String = raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase();
            if !EK_SHAPE.is_match(&code) {
                return None;
            }
            code
        }
        TytField::Institution => {
            let name = crate::utils::collapse_whitespace(raw);
            if name.chars().count() <= MIN_NAME_CHARS {
                return None;
            }
            name
        }
        TytField::Program => {
            let name = crate::utils::collapse_whitespace(raw);
            let name = TRAILING_NUMERAL.replace(&name, "").trim().to_string();
            if name.chars().count() <= MIN_NAME_CHARS {
                return None;
            }
            name
        }
        TytField::PresentationDate => raw.trim().to_string(),
    };

    (!value.is_empty()).then_some(value)
}
