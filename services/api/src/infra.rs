use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use loan_pipeline::config::EngineConfig;
use loan_pipeline::error::AppError;
use loan_pipeline::workflows::documents::{
    Classification, ClassificationRequest, ClassifierError, DocumentClassifier, DocumentType,
};
use loan_pipeline::workflows::eligibility::{
    DirectoryError, EligibilityBands, EligibilityScorer, UniversityDirectory, UniversityProfile,
};
use loan_pipeline::workflows::leads::{
    AppliedTransition, CoApplicant, DocumentsStatus, EventError, EventPublisher, Lead, LeadEvent,
    LeadId, LeadRepository, LeadStatus, RepositoryError, StatusHistoryEntry,
    StatusHistoryRepository, StudentProfile, StudyPlan,
};
use loan_pipeline::workflows::lenders::{
    AcceptanceRecord, AcceptanceStore, AcceptanceStoreError, CsvLenderDirectory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct LeadTables {
    leads: HashMap<LeadId, Lead>,
    history: Vec<StatusHistoryEntry>,
}

/// Process-local lead store. Lead row and history row share one lock so a
/// transition is all-or-nothing.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadStore {
    tables: Arc<Mutex<LeadTables>>,
}

impl InMemoryLeadStore {
    pub(crate) fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.lock() {
            for lead in leads {
                tables.leads.insert(lead.id.clone(), lead);
            }
        }
        store
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, LeadTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store lock poisoned".to_string()))
    }
}

impl LeadRepository for InMemoryLeadStore {
    fn get(&self, lead_id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.tables()?.leads.get(lead_id).cloned())
    }

    fn apply_transition(
        &self,
        lead_id: &LeadId,
        change: &AppliedTransition,
        expected_version: u64,
    ) -> Result<Lead, RepositoryError> {
        let mut tables = self.tables()?;
        let lead = tables
            .leads
            .get_mut(lead_id)
            .ok_or(RepositoryError::NotFound)?;
        if lead.version != expected_version {
            return Err(RepositoryError::Stale {
                expected: expected_version,
                found: lead.version,
            });
        }

        lead.status = change.status;
        lead.documents_status = change.documents_status;
        lead.stage_started_at = change.stage_started_at;
        lead.version += 1;
        let updated = lead.clone();
        tables.history.push(change.history.clone());
        Ok(updated)
    }

    fn list(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        let tables = self.tables()?;
        let mut leads: Vec<Lead> = tables.leads.values().cloned().collect();
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        leads.truncate(limit);
        Ok(leads)
    }
}

impl StatusHistoryRepository for InMemoryLeadStore {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        self.tables()?.history.push(entry);
        Ok(())
    }

    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Ok(self
            .tables()?
            .history
            .iter()
            .filter(|entry| &entry.lead_id == lead_id)
            .cloned()
            .collect())
    }
}

/// Stands in for the notification dispatcher: keeps events and logs them.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEventLog {
    events: Arc<Mutex<Vec<LeadEvent>>>,
}

impl EventPublisher for InMemoryEventLog {
    fn publish(&self, event: LeadEvent) -> Result<(), EventError> {
        debug!(?event, "lead event recorded");
        self.events
            .lock()
            .map_err(|_| EventError::Transport("event log lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

impl InMemoryEventLog {
    pub(crate) fn events(&self) -> Vec<LeadEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAcceptanceStore {
    records: Arc<Mutex<Vec<AcceptanceRecord>>>,
}

impl AcceptanceStore for InMemoryAcceptanceStore {
    fn record(&self, record: AcceptanceRecord) -> Result<(), AcceptanceStoreError> {
        self.records
            .lock()
            .map_err(|_| AcceptanceStoreError::Unavailable("lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

impl InMemoryAcceptanceStore {
    pub(crate) fn records(&self) -> Vec<AcceptanceRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

/// Small fixed university table used until the catalogue service is wired in.
#[derive(Debug, Clone)]
pub(crate) struct StaticUniversityDirectory {
    entries: HashMap<String, UniversityProfile>,
}

impl Default for StaticUniversityDirectory {
    fn default() -> Self {
        let entries = [
            ("uoft", 95, "Canada"),
            ("ubc", 90, "Canada"),
            ("tum", 88, "Germany"),
            ("asu", 72, "USA"),
            ("coventry", 55, "UK"),
            ("lambton", 35, "Canada"),
        ]
        .into_iter()
        .map(|(id, score, country)| {
            (
                id.to_string(),
                UniversityProfile {
                    rank_or_score: score,
                    country: country.to_string(),
                },
            )
        })
        .collect();
        Self { entries }
    }
}

impl UniversityDirectory for StaticUniversityDirectory {
    fn lookup(&self, university_id: &str) -> Result<Option<UniversityProfile>, DirectoryError> {
        Ok(self
            .entries
            .get(&university_id.trim().to_ascii_lowercase())
            .cloned())
    }
}

const SAMPLE_LENDERS: &str = "\
Lender ID,Name,Countries,Min Amount,Max Amount,Active
credila,Credila,USA;Canada;UK;Germany,500000,15000000,Yes
avanse,Avanse Financial,USA;Canada;UK,400000,7500000,Yes
auxilo,Auxilo,Germany;Canada,300000,4000000,Yes
incred,InCred,USA;UK,500000,5000000,Yes
";

/// Bands and lender directory from the configured files, falling back to the
/// standard bands and the bundled sample directory.
pub(crate) fn load_engine(
    config: &EngineConfig,
) -> Result<(EligibilityScorer, CsvLenderDirectory), AppError> {
    let bands = match config.eligibility_bands_path.as_deref() {
        Some(path) => {
            let bands = EligibilityBands::from_path(path)?;
            info!(path = %path.display(), version = %bands.version, "eligibility bands loaded");
            bands
        }
        None => EligibilityBands::standard(),
    };
    let scorer = EligibilityScorer::new(bands).map_err(|err| AppError::Engine(err.into()))?;

    let lenders = match config.lender_directory_path.as_deref() {
        Some(path) => {
            let directory = CsvLenderDirectory::from_path(path)?;
            info!(path = %path.display(), lenders = directory.len(), "lender directory loaded");
            directory
        }
        None => CsvLenderDirectory::from_reader(SAMPLE_LENDERS.as_bytes())?,
    };

    Ok((scorer, lenders))
}

/// Filename-driven classifier for local runs; production plugs in the model.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FilenameClassifier;

#[async_trait]
impl DocumentClassifier for FilenameClassifier {
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<Option<Classification>, ClassifierError> {
        let name = request.file_name.to_ascii_lowercase();
        let guess = if name.contains("passport") {
            Some((DocumentType::Passport, 94))
        } else if name.contains("aadhaar") || name.contains("aadhar") {
            Some((DocumentType::AadhaarCard, 91))
        } else if name.contains("pan") {
            Some((DocumentType::PanCard, 88))
        } else if name.contains("admission") || name.contains("offer") {
            Some((DocumentType::AdmissionLetter, 82))
        } else if name.contains("statement") {
            Some((DocumentType::BankStatement, 64))
        } else if name.contains("salary") || name.contains("payslip") {
            Some((DocumentType::SalarySlip, 55))
        } else {
            None
        };

        Ok(guess.map(|(detected_type, confidence)| Classification {
            detected_type,
            detected_type_label: detected_type.label().to_string(),
            confidence,
            quality_assessment: None,
            red_flags: Vec::new(),
            notes: Some(format!("matched on file name '{}'", request.file_name)),
        }))
    }
}

/// Seed pipeline shown by the dev server and the demo.
pub(crate) fn sample_leads(now: DateTime<Utc>) -> Vec<Lead> {
    let lead = |id: &str, status: LeadStatus, hours: i64, name: &str, destination: &str| Lead {
        id: LeadId::new(id),
        status,
        documents_status: DocumentsStatus::NotUploaded,
        stage_started_at: now - Duration::hours(hours),
        version: 0,
        loan_amount: Some(3_500_000),
        student: StudentProfile {
            full_name: Some(name.to_string()),
            email: Some(format!("{}@example.com", id.replace('-', "."))),
            phone: Some("9845012345".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(2002, 3, 11),
            pin_code: Some("560034".to_string()),
            city: Some("Bengaluru".to_string()),
        },
        study: StudyPlan {
            study_destination: Some(destination.to_string()),
            university_id: None,
            university_name: None,
            course_name: Some("MS Computer Science".to_string()),
            intake_month: Some(9),
            intake_year: Some(2025),
            admission_status: Some("applied".to_string()),
        },
        co_applicant: Some(CoApplicant {
            id: Some(format!("{id}-co")),
            name: Some("Suresh Rao".to_string()),
            relationship: Some("father".to_string()),
            phone: Some("9845000000".to_string()),
            monthly_salary: Some(95_000),
            pin_code: Some("560034".to_string()),
            occupation: Some("Business".to_string()),
            email: None,
        }),
    };

    let mut missing_pin = lead("lead-1003", LeadStatus::DocumentsPending, 20, "Farhan Ali", "UK");
    missing_pin.student.pin_code = Some("000000".to_string());
    missing_pin.co_applicant = None;

    vec![
        lead("lead-1001", LeadStatus::NewLead, 4, "Meera Rao", "Canada"),
        lead("lead-1002", LeadStatus::Contacted, 30, "Arjun Menon", "USA"),
        missing_pin,
        lead("lead-1004", LeadStatus::LoggedWithLender, 40, "Kavya Nair", "Germany"),
        lead("lead-1005", LeadStatus::CreditReview, 90, "Rohan Das", "Canada"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_pipeline::workflows::documents::{classify_batch, DocumentSlot, FileId, SlotState};
    use std::time::Duration;

    #[tokio::test]
    async fn filename_classifier_drives_the_batch_queue() {
        let slots = vec![
            DocumentSlot::queued(
                FileId::new("file-1"),
                "passport_front.jpg",
                Some(DocumentType::Passport),
                b"scan".to_vec(),
            ),
            DocumentSlot::queued(FileId::new("file-2"), "IMG_2024.png", None, b"scan".to_vec()),
        ];

        let slots = classify_batch(Arc::new(FilenameClassifier), slots, Duration::from_secs(1)).await;

        match slots[0].state() {
            SlotState::Suggested {
                classification,
                needs_attention,
            } => {
                assert_eq!(classification.detected_type, DocumentType::Passport);
                assert_eq!(classification.confidence, 94);
                assert!(!needs_attention);
            }
            other => panic!("expected a suggestion, got {other:?}"),
        }
        assert!(matches!(
            slots[1].state(),
            SlotState::ManualTypeRequired { .. }
        ));
        assert!(slots
            .iter()
            .all(|slot| !matches!(slot.state(), SlotState::Confirmed { .. })));
    }

    #[test]
    fn stale_version_is_refused_without_touching_history() {
        let store = InMemoryLeadStore::with_leads(sample_leads(Utc::now()));
        let lead = LeadRepository::get(&store, &LeadId::new("lead-1001"))
            .expect("store readable")
            .expect("seeded lead");
        let change = AppliedTransition {
            status: LeadStatus::Contacted,
            documents_status: lead.documents_status,
            stage_started_at: Utc::now(),
            status_changed: true,
            history: StatusHistoryEntry {
                lead_id: lead.id.clone(),
                old_status: lead.status,
                new_status: LeadStatus::Contacted,
                old_documents_status: lead.documents_status,
                new_documents_status: lead.documents_status,
                changed_by: "counselor-1".into(),
                reason_code: None,
                notes: String::new(),
                additional_data: Default::default(),
                changed_at: Utc::now(),
            },
        };

        let error = store
            .apply_transition(&lead.id, &change, lead.version + 1)
            .expect_err("outdated version");
        assert!(matches!(error, RepositoryError::Stale { .. }));
        assert!(store.for_lead(&lead.id).expect("history").is_empty());
    }
}
