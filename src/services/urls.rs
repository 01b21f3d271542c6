//! Document links submitted in the request form.

use url::Url;

use crate::models::{DocumentType, DocumentUrls, RequestFields};

/// Hosts whose links are treated as document attachments.
pub const DEFAULT_ACCEPTED_HOSTS: &[&str] = &["drive.google.com", "docs.google.com"];

/// Form field holding the link for each document type.
const URL_FIELDS: [(&str, DocumentType); 10] = [
    ("Copia_de_cedula", DocumentType::Cedula),
    ("Diploma_y_acta_de_bachiller", DocumentType::DiplomaBachiller),
    ("Icfes", DocumentType::Icfes),
    ("diploma_tecnico", DocumentType::DiplomaTecnico),
    ("diploma_tecnologo", DocumentType::DiplomaTecnologo),
    ("Titulo_profesional", DocumentType::TituloProfesional),
    ("Prueba_T_T", DocumentType::PruebaTt),
    ("Soporte_de_encuesta_momento_0", DocumentType::EncuestaM0),
    ("Acta_de_homologacion", DocumentType::ActaHomologacion),
    ("Recibo_de_pago_derechos_de_grado", DocumentType::ReciboPago),
];

/// Document types in the order their link fields appear on a request.
pub(crate) fn request_order() -> impl Iterator<Item = DocumentType> {
    URL_FIELDS.iter().map(|(_, doc_type)| *doc_type)
}

/// Request field that carries the link for `doc_type`.
pub fn url_field(doc_type: DocumentType) -> &'static str {
    URL_FIELDS
        .iter()
        .find(|(_, t)| *t == doc_type)
        .map(|(field, _)| *field)
        .unwrap_or_default()
}

/// Collect the document links of a request, keeping only URLs on an
/// accepted host. Other values (blank, "N/A", free text, foreign hosts)
/// leave the type unattached.
pub fn extract_document_urls<S: AsRef<str>>(
    request: &RequestFields,
    accepted_hosts: &[S],
) -> DocumentUrls {
    let mut urls = DocumentUrls::new();

    for (field, doc_type) in URL_FIELDS {
        let Some(value) = request.str_value(field) else {
            continue;
        };
        let value = value.trim();

        match Url::parse(value) {
            Ok(url) if host_accepted(&url, accepted_hosts) => {
                urls.insert(doc_type, value.to_string());
            }
            Ok(url) => {
                tracing::debug!(field, host = ?url.host_str(), "Ignoring link on unaccepted host");
            }
            Err(_) => {
                tracing::debug!(field, "Ignoring non-URL value");
            }
        }
    }

    urls
}

fn host_accepted<S: AsRef<str>>(url: &Url, accepted_hosts: &[S]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    accepted_hosts
        .iter()
        .any(|h| h.as_ref().eq_ignore_ascii_case(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_drive_links_only() {
        let request = RequestFields::new()
            .with("Copia_de_cedula", "https://drive.google.com/open?id=1AbCdEfGhIjKlMn")
            .with("Prueba_T_T", " https://docs.google.com/document/d/1ZyXwVuTsRqPo/edit ")
            .with("Icfes", "https://example.com/icfes.pdf")
            .with("Acta_de_homologacion", "N/A")
            .with("diploma_tecnico", 42);

        let urls = extract_document_urls(&request, DEFAULT_ACCEPTED_HOSTS);
        assert_eq!(urls.len(), 2);
        assert_eq!(
            urls[&DocumentType::Cedula],
            "https://drive.google.com/open?id=1AbCdEfGhIjKlMn"
        );
        assert_eq!(
            urls[&DocumentType::PruebaTt],
            "https://docs.google.com/document/d/1ZyXwVuTsRqPo/edit"
        );
    }

    #[test]
    fn test_host_must_match_exactly() {
        let request = RequestFields::new()
            .with("Copia_de_cedula", "https://drive.google.com.evil.example/file")
            .with("Icfes", "https://DRIVE.GOOGLE.COM/file/d/abc");
        let urls = extract_document_urls(&request, DEFAULT_ACCEPTED_HOSTS);
        assert!(!urls.contains_key(&DocumentType::Cedula));
        assert!(urls.contains_key(&DocumentType::Icfes));
    }

    #[test]
    fn test_every_type_has_a_field() {
        for doc_type in DocumentType::ALL {
            assert!(!url_field(doc_type).is_empty());
        }
    }
}
