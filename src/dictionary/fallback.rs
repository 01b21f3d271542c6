//! Built-in vocabularies used when a dictionary file is missing or too small.

use super::DictionaryKey;
use crate::models::DocumentType;

/// Built-in keywords for a dictionary key.
pub fn fallback_words(key: DictionaryKey) -> &'static [&'static str] {
    match key {
        DictionaryKey::Document(doc_type) => match doc_type {
            DocumentType::Cedula => &[
                "cédula",
                "cedula",
                "ciudadanía",
                "ciudadania",
                "documento",
                "identidad",
                "registrador",
                "registro",
                "civil",
                "estado",
                "nacional",
                "república",
                "republica",
                "colombia",
                "número",
                "numero",
            ],
            DocumentType::DiplomaBachiller => &[
                "bachiller",
                "académico",
                "academico",
                "media",
                "educación",
                "educacion",
                "superior",
                "título",
                "titulo",
                "diploma",
                "grado",
                "certificado",
                "institucional",
                "colegio",
                "instituto",
            ],
            DocumentType::DiplomaTecnico => &[
                "técnico",
                "tecnico",
                "tecnología",
                "tecnologia",
                "formación",
                "formacion",
                "profesional",
                "diploma",
                "certificado",
                "título",
                "titulo",
                "grado",
            ],
            DocumentType::DiplomaTecnologo => &[
                "tecnólogo",
                "tecnologo",
                "tecnología",
                "tecnologia",
                "superior",
                "formación",
                "formacion",
                "profesional",
                "diploma",
                "título",
                "titulo",
                "grado",
            ],
            DocumentType::TituloProfesional => &[
                "profesional",
                "universitario",
                "superior",
                "grado",
                "título",
                "titulo",
                "diploma",
                "educación",
                "educacion",
                "universidad",
                "facultad",
            ],
            DocumentType::PruebaTt => &[
                "transición",
                "transicion",
                "trabajo",
                "saber",
                "icfes",
                "evaluación",
                "evaluacion",
                "competencias",
                "prueba",
                "examen",
                "resultado",
                "puntaje",
            ],
            DocumentType::Icfes => &[
                "icfes",
                "saber",
                "once",
                "11",
                "evaluación",
                "evaluacion",
                "prueba",
                "examen",
                "resultado",
                "puntaje",
                "competencias",
                "educación",
                "educacion",
            ],
            DocumentType::ReciboPago => &[
                "pago",
                "recibo",
                "derechos",
                "grado",
                "valor",
                "cancelado",
                "pagado",
                "factura",
                "comprobante",
                "transacción",
                "transaccion",
            ],
            DocumentType::EncuestaM0 => &[
                "encuesta",
                "seguimiento",
                "momento",
                "observatorio",
                "laboral",
                "graduados",
                "programa",
                "formación",
                "formacion",
                "empleabilidad",
            ],
            DocumentType::ActaHomologacion => &[
                "homologación",
                "homologacion",
                "reconocimiento",
                "convalidación",
                "convalidacion",
                "equivalencia",
                "materias",
                "asignaturas",
                "créditos",
                "creditos",
            ],
        },
        // Whole names only; single words like "nacional" or "cun" occur in
        // other institutions' names.
        DictionaryKey::Institutions => &[
            "corporación unificada nacional de educación superior",
            "corporacion unificada nacional de educacion superior",
            "corporación unificada nacional",
            "corporacion unificada nacional",
            "unificada nacional",
            "-cun-",
            "(cun)",
        ],
    }
}
