use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::eligibility::{
    DirectoryError, EligibilityBands, EligibilityScorer, EligibilityService, UniversityDirectory,
    UniversityProfile,
};
use crate::workflows::leads::domain::{
    Actor, ActorRole, AppliedTransition, CoApplicant, DocumentsStatus, Lead, LeadEvent, LeadId,
    LeadStatus, StatusHistoryEntry, StatusTransitionRequest, StudentProfile, StudyPlan,
    TransitionData,
};
use crate::workflows::leads::repository::{
    EventError, EventPublisher, LeadRepository, RepositoryError, StatusHistoryRepository,
};
use crate::workflows::leads::registry::StatusRegistry;
use crate::workflows::leads::service::{Clock, LeadLifecycleService};
use crate::workflows::leads::lead_router;
use crate::workflows::lenders::directory::CsvLenderDirectory;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 10, 0, 0).unwrap()
}

pub(super) fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - Duration::hours(hours)
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn admin() -> Actor {
    Actor::new("admin-1", ActorRole::Admin)
}

pub(super) fn counselor() -> Actor {
    Actor::new("counselor-7", ActorRole::Counselor)
}

pub(super) fn complete_lead(id: &str, status: LeadStatus) -> Lead {
    Lead {
        id: LeadId::new(id),
        status,
        documents_status: DocumentsStatus::NotUploaded,
        stage_started_at: hours_ago(10),
        version: 3,
        loan_amount: Some(4_000_000),
        student: StudentProfile {
            full_name: Some("Ananya Iyer".to_string()),
            email: Some("ananya@example.com".to_string()),
            phone: Some("9845012345".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(2001, 6, 14),
            pin_code: Some("560034".to_string()),
            city: Some("Bengaluru".to_string()),
        },
        study: StudyPlan {
            study_destination: Some("Canada".to_string()),
            university_id: Some("uoft".to_string()),
            university_name: Some("University of Toronto".to_string()),
            course_name: Some("MSc Computer Science".to_string()),
            intake_month: Some(9),
            intake_year: Some(2025),
            admission_status: Some("admitted".to_string()),
        },
        co_applicant: Some(CoApplicant {
            id: Some("co-1".to_string()),
            name: Some("Ramesh Iyer".to_string()),
            relationship: Some("father".to_string()),
            phone: Some("9845000000".to_string()),
            monthly_salary: Some(140_000),
            pin_code: Some("560034".to_string()),
            occupation: Some("Engineer".to_string()),
            email: Some("ramesh@example.com".to_string()),
        }),
    }
}

/// Co-applicant row created by intake before the applicant typed anything.
pub(super) fn placeholder_co_applicant() -> CoApplicant {
    CoApplicant {
        id: Some("co-placeholder".to_string()),
        name: Some("Co-Applicant".to_string()),
        relationship: Some(String::new()),
        phone: None,
        monthly_salary: Some(0),
        pin_code: Some("000000".to_string()),
        occupation: None,
        email: None,
    }
}

pub(super) fn request(lead_id: &str, status: Option<LeadStatus>) -> StatusTransitionRequest {
    StatusTransitionRequest {
        lead_id: LeadId::new(lead_id),
        status,
        documents_status: None,
        reason_code: None,
        notes: String::new(),
        additional_data: TransitionData::default(),
    }
}

pub(super) fn admin_request(lead_id: &str, status: LeadStatus) -> StatusTransitionRequest {
    StatusTransitionRequest {
        notes: "Verified with lender over call".to_string(),
        ..request(lead_id, Some(status))
    }
}

#[derive(Default)]
struct StoreState {
    leads: HashMap<LeadId, Lead>,
    history: Vec<StatusHistoryEntry>,
}

/// In-memory lead store; lead and history are written under one lock.
#[derive(Default)]
pub(super) struct MemoryLeadStore {
    state: Mutex<StoreState>,
    race_next_write: AtomicBool,
}

impl MemoryLeadStore {
    pub(super) fn with_leads(leads: Vec<Lead>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().expect("store mutex poisoned");
            for lead in leads {
                state.leads.insert(lead.id.clone(), lead);
            }
        }
        store
    }

    /// Simulate another actor committing between our read and our write.
    pub(super) fn lose_next_race(&self) {
        self.race_next_write.store(true, Ordering::SeqCst);
    }

    pub(super) fn history_len(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").history.len()
    }

    pub(super) fn lead(&self, id: &str) -> Lead {
        self.state.lock().expect("store mutex poisoned").leads[&LeadId::new(id)].clone()
    }
}

impl LeadRepository for MemoryLeadStore {
    fn get(&self, lead_id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.leads.get(lead_id).cloned())
    }

    fn apply_transition(
        &self,
        lead_id: &LeadId,
        change: &AppliedTransition,
        expected_version: u64,
    ) -> Result<Lead, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let lead = state.leads.get_mut(lead_id).ok_or(RepositoryError::NotFound)?;

        if self.race_next_write.swap(false, Ordering::SeqCst) {
            lead.version += 1;
        }
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
        state.history.push(change.history.clone());
        Ok(updated)
    }

    fn list(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut leads: Vec<Lead> = state.leads.values().cloned().collect();
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        leads.truncate(limit);
        Ok(leads)
    }
}

impl StatusHistoryRepository for MemoryLeadStore {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .history
            .push(entry);
        Ok(())
    }

    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .history
            .iter()
            .filter(|entry| &entry.lead_id == lead_id)
            .cloned()
            .collect())
    }
}

pub(super) struct OfflineStore;

impl LeadRepository for OfflineStore {
    fn get(&self, _lead_id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_transition(
        &self,
        _lead_id: &LeadId,
        _change: &AppliedTransition,
        _expected_version: u64,
    ) -> Result<Lead, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl StatusHistoryRepository for OfflineStore {
    fn append(&self, _entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_lead(&self, _lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Row store keeping the status column as the raw persisted string.
pub(super) struct RawStatusStore {
    rows: Vec<(Lead, String)>,
}

impl RawStatusStore {
    pub(super) fn with_row(lead: Lead, raw_status: &str) -> Self {
        Self {
            rows: vec![(lead, raw_status.to_string())],
        }
    }

    fn decode(lead: &Lead, raw_status: &str) -> Result<Lead, RepositoryError> {
        let status = StatusRegistry::resolve(raw_status)?;
        Ok(Lead {
            status,
            ..lead.clone()
        })
    }
}

impl LeadRepository for RawStatusStore {
    fn get(&self, lead_id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        self.rows
            .iter()
            .find(|(lead, _)| &lead.id == lead_id)
            .map(|(lead, raw)| Self::decode(lead, raw))
            .transpose()
    }

    fn apply_transition(
        &self,
        _lead_id: &LeadId,
        _change: &AppliedTransition,
        _expected_version: u64,
    ) -> Result<Lead, RepositoryError> {
        Err(RepositoryError::Unavailable("read-only fixture".to_string()))
    }

    fn list(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        self.rows
            .iter()
            .take(limit)
            .map(|(lead, raw)| Self::decode(lead, raw))
            .collect()
    }
}

impl StatusHistoryRepository for RawStatusStore {
    fn append(&self, _entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn for_lead(&self, _lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<LeadEvent>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<LeadEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: LeadEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct DroppedEvents;

impl EventPublisher for DroppedEvents {
    fn publish(&self, _event: LeadEvent) -> Result<(), EventError> {
        Err(EventError::Transport("broker unreachable".to_string()))
    }
}

pub(super) type TestService = LeadLifecycleService<MemoryLeadStore, MemoryLeadStore, MemoryEvents>;

pub(super) fn build_service(
    leads: Vec<Lead>,
) -> (TestService, Arc<MemoryLeadStore>, Arc<MemoryEvents>) {
    let store = Arc::new(MemoryLeadStore::with_leads(leads));
    let events = Arc::new(MemoryEvents::default());
    let service = LeadLifecycleService::with_clock(
        store.clone(),
        store.clone(),
        events.clone(),
        Arc::new(FixedClock(now())),
    );
    (service, store, events)
}

struct SingleUniversity;

impl UniversityDirectory for SingleUniversity {
    fn lookup(&self, university_id: &str) -> Result<Option<UniversityProfile>, DirectoryError> {
        Ok((university_id == "uoft").then(|| UniversityProfile {
            rank_or_score: 95,
            country: "Canada".to_string(),
        }))
    }
}

const LENDERS: &str = "\
Lender ID,Name,Countries,Min Amount,Max Amount,Active
avanse,Avanse Financial,Canada;USA,500000,7500000,Yes
credila,Credila,Canada;UK,1000000,15000000,Yes
";

pub(super) fn eligibility_service() -> Arc<EligibilityService> {
    let lenders = CsvLenderDirectory::from_reader(LENDERS.as_bytes()).expect("lender fixture");
    let scorer = EligibilityScorer::new(EligibilityBands::standard()).expect("standard bands");
    Arc::new(EligibilityService::new(
        Arc::new(SingleUniversity),
        Arc::new(lenders),
        scorer,
    ))
}

pub(super) fn router_with(service: TestService) -> axum::Router {
    lead_router(Arc::new(service), eligibility_service())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
