//! Text normalization helpers shared by matching and extraction.

/// Replace Spanish/Latin diacritics with their base letter.
///
/// Only the letters that show up in Colombian academic documents are mapped;
/// everything else passes through unchanged.
pub fn fold_accents(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        other => other,
    }
}

/// Collapse every whitespace run (including newlines) into one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only ASCII digits.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Build a case-insensitive regex fragment matching `s` with or without
/// diacritics and with flexible whitespace between words.
pub fn accent_tolerant_pattern(s: &str) -> String {
    let folded = fold_accents(&s.to_lowercase());
    let mut out = String::with_capacity(folded.len() * 4);
    let mut in_space = false;

    for c in folded.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push_str(r"\s+");
                in_space = true;
            }
            continue;
        }
        in_space = false;
        match c {
            'a' => out.push_str("[aáàâä]"),
            'e' => out.push_str("[eéèêë]"),
            'i' => out.push_str("[iíìîï]"),
            'o' => out.push_str("[oóòôö]"),
            'u' => out.push_str("[uúùûü]"),
            'n' => out.push_str("[nñ]"),
            'c' => out.push_str("[cç]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("cédula de ciudadanía"), "cedula de ciudadania");
        assert_eq!(fold_accents("ÑANDÚ"), "NANDU");
        assert_eq!(fold_accents("plain"), "plain");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("1.023.456-7"), "10234567");
    }

    #[test]
    fn test_accent_tolerant_pattern_matches_both_spellings() {
        let re = regex::Regex::new(&format!(
            "(?i){}",
            accent_tolerant_pattern("Tecnología en  Gestión")
        ))
        .unwrap();
        assert!(re.is_match("TECNOLOGIA EN GESTION"));
        assert!(re.is_match("tecnología en\ngestión"));
        assert!(!re.is_match("tecnologia gestion"));
    }

    #[test]
    fn test_accent_tolerant_pattern_escapes_metacharacters() {
        let re = regex::Regex::new(&accent_tolerant_pattern("c.u.n (sede)")).unwrap();
        assert!(re.is_match("c.u.n (sede)"));
        assert!(!re.is_match("cxuxn sede"));
    }
}
