//! End-to-end request processing with a scripted text extraction service.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use gradcheck::dictionary::{DictionaryKey, DictionaryRepository};
use gradcheck::models::{
    keys, status, DocumentDescriptor, DocumentType, DocumentUrls, OutputField, RequestFields,
};
use gradcheck::ocr::{ExtractionError, TextExtractionService};
use gradcheck::services::{DocumentOrchestrator, PriorityPlan, PriorityTier, ProcessEvent};

const TYT_REPORT: &str = "\
REPORTE DE RESULTADOS SABER TYT
Identificación: C.C. 1.023.456.789
Número de registro: EK20231234567
Institución de educación superior: CORPORACION UNIFICADA NACIONAL
DE EDUCACION SUPERIOR-CUN-BOGOTÁ D.C.
Programa Académico: TECNICO PROFESIONAL EN PROCESOS ADMINISTRATIVOS 2.
Aplicación del examen: 13/08/2023
Puntaje global 152, percentil 71
";

const OTHER_INSTITUTION_REPORT: &str = "\
REPORTE DE RESULTADOS SABER TYT
Identificación: C.C. 1.023.456.789
Número de registro: EK20231234567
Institución de educación superior: UNIVERSIDAD DE CUNDINAMARCA-FACATATIVÁ
Programa Académico: TECNICO PROFESIONAL EN PROCESOS ADMINISTRATIVOS
Aplicación del examen: 13/08/2023
Puntaje global 152, percentil 71
";

const CEDULA_TEXT: &str = "REPUBLICA DE COLOMBIA IDENTIFICACION PERSONAL \
CEDULA DE CIUDADANIA NUMERO 1.023.456.789 APELLIDOS PEREZ GOMEZ NOMBRES JUAN CARLOS";

const ICFES_TEXT: &str = "Examen de Estado Saber 11 - Reporte de resultados. \
Puntaje global 301. Lectura crítica 60, Matemáticas 58.";

/// What the scripted service does for a document type.
#[derive(Clone)]
enum Script {
    Text(&'static str),
    Slow(Duration, &'static str),
    Html,
    Panic,
}

/// Text extraction service that follows a script and counts calls.
#[derive(Default)]
struct ScriptedExtractor {
    scripts: HashMap<DocumentType, Script>,
    calls: AtomicUsize,
    seen: Mutex<Vec<DocumentType>>,
}

impl ScriptedExtractor {
    fn with(mut self, doc_type: DocumentType, script: Script) -> Self {
        self.scripts.insert(doc_type, script);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<DocumentType> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractionService for ScriptedExtractor {
    async fn extract(&self, _path: &Path, doc_type: DocumentType) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(doc_type);

        match self.scripts.get(&doc_type).cloned() {
            Some(Script::Text(text)) => Ok(text.to_string()),
            Some(Script::Slow(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text.to_string())
            }
            Some(Script::Html) => Err(ExtractionError::HtmlDetected),
            Some(Script::Panic) => panic!("extractor exploded on {}", doc_type),
            None => Err(ExtractionError::NoText),
        }
    }
}

fn write_dictionary(dir: &Path, key: DictionaryKey, words: &[&str]) {
    std::fs::write(dir.join(key.file_name()), words.join("\n")).unwrap();
}

/// Dictionary directory with real files for the types the tests use.
fn dictionaries() -> (TempDir, Arc<DictionaryRepository>) {
    let dir = TempDir::new().unwrap();
    write_dictionary(
        dir.path(),
        DocumentType::Cedula.into(),
        &[
            "república de colombia",
            "identificación personal",
            "cédula de ciudadanía",
            "apellidos",
            "nombres",
            "registraduría nacional",
        ],
    );
    write_dictionary(
        dir.path(),
        DocumentType::PruebaTt.into(),
        &[
            "saber tyt",
            "reporte de resultados",
            "número de registro",
            "puntaje global",
            "percentil",
            "aplicación del examen",
        ],
    );
    write_dictionary(
        dir.path(),
        DocumentType::Icfes.into(),
        &[
            "saber 11",
            "examen de estado",
            "puntaje global",
            "lectura crítica",
            "matemáticas",
        ],
    );
    write_dictionary(
        dir.path(),
        DictionaryKey::Institutions,
        &[
            "corporación unificada nacional de educación superior",
            "corporacion unificada nacional",
            "unificada nacional",
            "cun bogotá",
            "educación superior cun",
        ],
    );
    let repo = Arc::new(DictionaryRepository::new(dir.path()));
    (dir, repo)
}

fn request() -> RequestFields {
    RequestFields::new()
        .with(keys::ID, 4711)
        .with(keys::FULL_NAME, "Juan Carlos Perez Gomez")
        .with(keys::ID_TYPE, "CC")
        .with(keys::ID_NUMBER, "1023456789")
        .with(keys::LEVEL, "Tecnico Profesional")
        .with(keys::INSTITUTIONAL_EMAIL, "jperez@cun.edu.co")
}

fn url(doc_type: DocumentType) -> String {
    format!("https://drive.google.com/file/d/{}/view", doc_type.as_str())
}

/// URL map and successful descriptors for `types`.
fn attach(types: &[DocumentType]) -> (DocumentUrls, Vec<DocumentDescriptor>) {
    let urls: DocumentUrls = types.iter().map(|&t| (t, url(t))).collect();
    let descriptors = types
        .iter()
        .map(|&t| DocumentDescriptor::downloaded(url(t), format!("/tmp/{}.pdf", t.as_str())))
        .collect();
    (urls, descriptors)
}

fn assert_complete(record: &gradcheck::models::OutputRecord) {
    assert_eq!(record.len(), OutputField::ALL.len());
    assert!(record.is_complete());
    for field in OutputField::ALL {
        assert!(record.get(field).is_some(), "missing {}", field.key());
    }
}

#[tokio::test]
async fn test_empty_request_yields_complete_record() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(ScriptedExtractor::default());
    let orchestrator = DocumentOrchestrator::new(extractor.clone(), repo);

    let record = orchestrator
        .process(&RequestFields::new(), &[], &DocumentUrls::new())
        .await;

    assert_complete(&record);
    for doc_type in DocumentType::ALL {
        assert_eq!(record.status_of(doc_type), Some(status::NOT_ATTACHED));
    }
    assert_eq!(record.get(OutputField::Id), Some(""));
    assert_eq!(
        record.get(OutputField::NumDocValido),
        Some(status::NOT_APPLICABLE)
    );
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_unattached_types_are_never_extracted() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default()
            .with(DocumentType::Cedula, Script::Text(CEDULA_TEXT))
            .with(DocumentType::Icfes, Script::Text(ICFES_TEXT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor.clone(), repo);

    // Icfes was downloaded but is not in the URL map
    let (urls, mut descriptors) = attach(&[DocumentType::Cedula]);
    descriptors.push(DocumentDescriptor::downloaded(
        url(DocumentType::Icfes),
        "/tmp/icfes.pdf",
    ));

    let record = orchestrator.process(&request(), &descriptors, &urls).await;

    assert_complete(&record);
    assert_eq!(
        record.status_of(DocumentType::Cedula),
        Some(status::VALID_DOCUMENT)
    );
    assert_eq!(
        record.status_of(DocumentType::Icfes),
        Some(status::NOT_ATTACHED)
    );
    assert_eq!(extractor.calls(), 1);
    assert_eq!(extractor.seen(), vec![DocumentType::Cedula]);
}

#[tokio::test]
async fn test_tyt_fields_and_cross_checks() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default().with(DocumentType::PruebaTt, Script::Text(TYT_REPORT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor, repo);
    let (urls, descriptors) = attach(&[DocumentType::PruebaTt]);

    let record = orchestrator.process(&request(), &descriptors, &urls).await;

    assert_complete(&record);
    assert_eq!(
        record.status_of(DocumentType::PruebaTt),
        Some(status::VALID_DOCUMENT)
    );
    assert_eq!(record.get(OutputField::RegistroEk), Some("EK20231234567"));
    assert_eq!(
        record.get(OutputField::NumDocumentoExtraido),
        Some("1023456789")
    );
    assert_eq!(
        record.get(OutputField::ProgramaExtraido),
        Some("TECNICO PROFESIONAL EN PROCESOS ADMINISTRATIVOS")
    );
    assert_eq!(
        record.get(OutputField::FechaPresentacionExtraida),
        Some("13/08/2023")
    );
    assert_eq!(record.get(OutputField::NumDocValido), Some(status::VALID));
    assert_eq!(
        record.get(OutputField::InstitucionValida),
        Some(status::VALID)
    );
}

#[tokio::test]
async fn test_identity_mismatch_needs_review() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default().with(DocumentType::PruebaTt, Script::Text(TYT_REPORT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor, repo);
    let (urls, descriptors) = attach(&[DocumentType::PruebaTt]);
    let request = request().with(keys::ID_NUMBER, "79.555.123");

    let record = orchestrator.process(&request, &descriptors, &urls).await;

    assert_eq!(
        record.get(OutputField::NumDocValido),
        Some(status::MANUAL_REVIEW)
    );
    assert_eq!(
        record.get(OutputField::InstitucionValida),
        Some(status::VALID)
    );
}

#[tokio::test]
async fn test_unrecognized_tyt_leaves_derived_fields() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default().with(DocumentType::PruebaTt, Script::Text(CEDULA_TEXT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor, repo);
    let (urls, descriptors) = attach(&[DocumentType::PruebaTt]);

    let record = orchestrator.process(&request(), &descriptors, &urls).await;

    assert_eq!(
        record.status_of(DocumentType::PruebaTt),
        Some(status::MANUAL_REVIEW)
    );
    assert_eq!(
        record.get(OutputField::RegistroEk),
        Some(status::NOT_APPLICABLE)
    );
}

#[tokio::test]
async fn test_failures_become_status_values() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default()
            .with(DocumentType::Cedula, Script::Html)
            .with(DocumentType::Icfes, Script::Panic)
            .with(DocumentType::PruebaTt, Script::Text(TYT_REPORT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor.clone(), repo);

    let (mut urls, mut descriptors) = attach(&[
        DocumentType::Cedula,
        DocumentType::Icfes,
        DocumentType::PruebaTt,
    ]);
    urls.insert(DocumentType::ReciboPago, url(DocumentType::ReciboPago));
    descriptors.push(DocumentDescriptor::failed(
        url(DocumentType::ReciboPago),
        "FILE_NOT_FOUND: El archivo no existe",
    ));
    urls.insert(DocumentType::EncuestaM0, url(DocumentType::EncuestaM0));
    descriptors.push(DocumentDescriptor {
        original_url: url(DocumentType::EncuestaM0),
        ..DocumentDescriptor::default()
    });

    let summary = orchestrator
        .process_with_summary(&request(), &descriptors, &urls)
        .await;
    let record = &summary.record;

    assert!(!summary.emergency);
    assert_complete(record);
    assert_eq!(
        record.status_of(DocumentType::Cedula),
        Some("Archivo HTML - Revision Manual")
    );
    assert_eq!(
        record.status_of(DocumentType::Icfes),
        Some("Error Interno - Revision Manual")
    );
    assert_eq!(
        record.status_of(DocumentType::ReciboPago),
        Some("Archivo No Encontrado - Revision Manual")
    );
    assert_eq!(
        record.status_of(DocumentType::EncuestaM0),
        Some("Archivo No Disponible - Revision Manual")
    );
    // The panic in one task does not disturb its siblings
    assert_eq!(
        record.status_of(DocumentType::PruebaTt),
        Some(status::VALID_DOCUMENT)
    );
    // Failed and path-less downloads never reach the extractor
    assert_eq!(extractor.calls(), 3);
}

#[tokio::test]
async fn test_tier_timeout_only_affects_its_tier() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default()
            .with(
                DocumentType::Cedula,
                Script::Slow(Duration::from_secs(10), CEDULA_TEXT),
            )
            .with(DocumentType::Icfes, Script::Text(ICFES_TEXT))
            .with(
                DocumentType::PruebaTt,
                Script::Slow(Duration::from_millis(20), TYT_REPORT),
            ),
    );
    let plan = PriorityPlan::new(vec![
        PriorityTier {
            types: vec![DocumentType::Cedula],
            timeout: Duration::from_millis(100),
        },
        PriorityTier {
            types: vec![DocumentType::Icfes, DocumentType::PruebaTt],
            timeout: Duration::from_secs(5),
        },
    ]);
    let orchestrator = DocumentOrchestrator::new(extractor, repo).with_plan(plan);
    let (urls, descriptors) = attach(&[
        DocumentType::Cedula,
        DocumentType::Icfes,
        DocumentType::PruebaTt,
    ]);

    let started = std::time::Instant::now();
    let summary = orchestrator
        .process_with_summary(&request(), &descriptors, &urls)
        .await;
    assert!(started.elapsed() < Duration::from_secs(5));

    let record = &summary.record;
    assert_complete(record);
    assert_eq!(summary.timed_out, vec![DocumentType::Cedula]);
    assert_eq!(
        record.status_of(DocumentType::Cedula),
        Some("Tiempo de Procesamiento Agotado - Revision Manual")
    );
    assert_eq!(
        record.status_of(DocumentType::Icfes),
        Some(status::VALID_DOCUMENT)
    );
    assert_eq!(
        record.status_of(DocumentType::PruebaTt),
        Some(status::VALID_DOCUMENT)
    );
    // Types outside the custom plan stay unattached
    assert_eq!(
        record.status_of(DocumentType::ReciboPago),
        Some(status::NOT_ATTACHED)
    );
}

#[tokio::test]
async fn test_progress_events() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default().with(DocumentType::Cedula, Script::Text(CEDULA_TEXT)),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let orchestrator = DocumentOrchestrator::new(extractor, repo).with_events(tx);
    let (urls, descriptors) = attach(&[DocumentType::Cedula]);

    orchestrator.process(&request(), &descriptors, &urls).await;
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let tiers_started = events
        .iter()
        .filter(|e| matches!(e, ProcessEvent::TierStarted { .. }))
        .count();
    assert_eq!(tiers_started, PriorityPlan::default().tiers().len());

    let completed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProcessEvent::DocumentCompleted {
                doc_type, status, ..
            } => Some((*doc_type, status.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![(DocumentType::Cedula, status::VALID_DOCUMENT.to_string())]
    );
}

#[tokio::test]
async fn test_unread_event_channel_does_not_block() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default()
            .with(DocumentType::Cedula, Script::Text(CEDULA_TEXT))
            .with(DocumentType::Icfes, Script::Text(ICFES_TEXT)),
    );
    let plan = PriorityPlan::new(vec![PriorityTier {
        types: vec![DocumentType::Cedula, DocumentType::Icfes],
        timeout: Duration::from_millis(200),
    }]);
    // Receiver stays open but is never read
    let (tx, _rx) = mpsc::channel(1);
    let orchestrator = DocumentOrchestrator::new(extractor, repo)
        .with_plan(plan)
        .with_events(tx);
    let (urls, descriptors) = attach(&[DocumentType::Cedula, DocumentType::Icfes]);

    let record = tokio::time::timeout(
        Duration::from_secs(3),
        orchestrator.process(&request(), &descriptors, &urls),
    )
    .await
    .expect("processing blocked on the event channel");

    assert_complete(&record);
    assert_eq!(
        record.status_of(DocumentType::Cedula),
        Some(status::VALID_DOCUMENT)
    );
    assert_eq!(
        record.status_of(DocumentType::Icfes),
        Some(status::VALID_DOCUMENT)
    );
}

#[tokio::test]
async fn test_other_institution_is_not_valid() {
    let (_dir, repo) = dictionaries();
    let extractor = Arc::new(
        ScriptedExtractor::default()
            .with(DocumentType::PruebaTt, Script::Text(OTHER_INSTITUTION_REPORT)),
    );
    let orchestrator = DocumentOrchestrator::new(extractor, repo);
    let (urls, descriptors) = attach(&[DocumentType::PruebaTt]);

    let record = orchestrator.process(&request(), &descriptors, &urls).await;

    assert_eq!(
        record.status_of(DocumentType::PruebaTt),
        Some(status::VALID_DOCUMENT)
    );
    assert_eq!(
        record.get(OutputField::InstitucionValida),
        Some(status::MANUAL_REVIEW)
    );
}

#[tokio::test]
async fn test_summary_serializes_record_keys() {
    let (_dir, repo) = dictionaries();
    let orchestrator = DocumentOrchestrator::new(Arc::new(ScriptedExtractor::default()), repo);

    let summary = orchestrator
        .process_with_summary(&request(), &[], &DocumentUrls::new())
        .await;
    let json = serde_json::to_value(&summary).unwrap();

    let record = json["record"].as_object().unwrap();
    assert_eq!(record.len(), 27);
    assert_eq!(record["ID"], "4711");
    assert_eq!(record["CorreoInsitucional"], "jperez@cun.edu.co");
    assert_eq!(record["FotocopiaDocumento"], status::NOT_ATTACHED);
    assert_eq!(json["emergency"], false);
}
