use crate::infra::{
    load_engine, sample_leads, FilenameClassifier, InMemoryAcceptanceStore, InMemoryEventLog,
    InMemoryLeadStore, StaticUniversityDirectory,
};
use chrono::Utc;
use clap::Args;
use loan_pipeline::config::EngineConfig;
use loan_pipeline::error::AppError;
use loan_pipeline::workflows::documents::{classify_batch, DocumentSlot, DocumentType, FileId, SlotState};
use loan_pipeline::workflows::eligibility::{
    EligibilityResult, EligibilityService, QuickCheckRequest,
};
use loan_pipeline::workflows::leads::{
    reduce, Actor, ActorRole, CoApplicant, DraftKey, IntakeAction, IntakeDraft, LeadId,
    LeadLifecycleService, LeadStatus, StatusTransitionRequest, StudentProfile, StudyPlan,
    TransitionData,
};
use loan_pipeline::workflows::lenders::{
    verdict_of, AcceptanceDesk, LenderEvaluation, LenderGroup, LenderId, ProbabilityBand,
    RecommendationSet,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct QuickCheckArgs {
    /// University identifier known to the directory (e.g. uoft, tum)
    #[arg(long)]
    pub(crate) university: Option<String>,
    /// Study destination country; defaults to the university's country
    #[arg(long)]
    pub(crate) destination: Option<String>,
    /// Co-applicant monthly salary in INR
    #[arg(long)]
    pub(crate) salary: u64,
    /// Requested loan amount in INR
    #[arg(long)]
    pub(crate) amount: u64,
    /// Eligibility bands JSON (defaults to the standard bands)
    #[arg(long)]
    pub(crate) bands: Option<PathBuf>,
    /// Lender directory CSV export (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) lenders: Option<PathBuf>,
    /// Print the raw result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Eligibility bands JSON (defaults to the standard bands)
    #[arg(long)]
    pub(crate) bands: Option<PathBuf>,
    /// Lender directory CSV export (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) lenders: Option<PathBuf>,
    /// Skip the document classification portion of the demo.
    #[arg(long)]
    pub(crate) skip_documents: bool,
}

fn eligibility_service(bands: Option<PathBuf>, lenders: Option<PathBuf>) -> Result<EligibilityService, AppError> {
    let (scorer, lenders) = load_engine(&EngineConfig {
        eligibility_bands_path: bands,
        lender_directory_path: lenders,
    })?;
    Ok(EligibilityService::new(
        Arc::new(StaticUniversityDirectory::default()),
        Arc::new(lenders),
        scorer,
    ))
}

pub(crate) fn run_quick_check(args: QuickCheckArgs) -> Result<(), AppError> {
    let QuickCheckArgs {
        university,
        destination,
        salary,
        amount,
        bands,
        lenders,
        json,
    } = args;

    let service = eligibility_service(bands, lenders)?;
    let result = service.quick_check(&QuickCheckRequest {
        university_id: university,
        study_destination: destination,
        co_applicant_monthly_salary: salary,
        requested_amount: amount,
    })?;

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Result unavailable as JSON: {err}"),
        }
    } else {
        render_eligibility(&result);
    }
    Ok(())
}

fn render_eligibility(result: &EligibilityResult) {
    println!(
        "Eligibility score {} ({:?}) using bands {}",
        result.score, result.result_category, result.bands_version
    );
    for component in &result.breakdown {
        println!(
            "  - {:?}: {}/{} ({})",
            component.factor, component.points, component.max_points, component.band
        );
    }
    println!(
        "  Estimated loan: {} - {} INR",
        result.estimated_loan_min, result.estimated_loan_max
    );
    println!(
        "  Indicative rate: {} - {}",
        percent(result.estimated_rate_min_bps),
        percent(result.estimated_rate_max_bps)
    );
    println!("  Matching lenders: {}", result.lender_count);
}

fn percent(bps: u32) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        bands,
        lenders,
        skip_documents,
    } = args;

    println!("Loan pipeline demo");

    let draft = match intake_draft() {
        Ok(draft) => draft,
        Err(err) => {
            println!("  Intake rejected: {err}");
            return Ok(());
        }
    };
    println!("\nIntake draft {} submitted", draft.key.0);

    let now = Utc::now();
    let intake_lead = match draft.clone().into_lead(LeadId::new("lead-2001"), now) {
        Ok(lead) => lead,
        Err(err) => {
            println!("  Draft could not become a lead: {err}");
            return Ok(());
        }
    };

    let eligibility = eligibility_service(bands, lenders)?;
    let result = eligibility.quick_check(&QuickCheckRequest {
        university_id: draft.study.as_ref().and_then(|study| study.university_id.clone()),
        study_destination: draft
            .study
            .as_ref()
            .and_then(|study| study.study_destination.clone()),
        co_applicant_monthly_salary: draft
            .co_applicant
            .as_ref()
            .and_then(|co| co.monthly_salary)
            .unwrap_or(0),
        requested_amount: draft.loan_amount.unwrap_or(0),
    })?;
    render_eligibility(&result);

    let mut leads = sample_leads(now);
    leads.push(intake_lead);
    let store = Arc::new(InMemoryLeadStore::with_leads(leads));
    let events = Arc::new(InMemoryEventLog::default());
    let lifecycle = LeadLifecycleService::new(store.clone(), store, events.clone());

    println!("\nLead lifecycle");
    let counselor = Actor::new("counselor-12", ActorRole::Counselor);
    let admin = Actor::new("admin-1", ActorRole::Admin);
    let lead_id = LeadId::new("lead-2001");

    let completion = lifecycle.completion(&lead_id)?;
    println!(
        "- {} completeness {}% (complete: {}, co-applicant: {})",
        lead_id, completion.completeness_score, completion.is_complete, completion.has_co_applicant
    );
    let required_gaps = completion.missing_required_keys();
    if !required_gaps.is_empty() {
        println!("    required gaps: {}", required_gaps.join(", "));
    }
    for field in &completion.missing_optional {
        println!("    optional gap: {}", field.display_name);
    }

    let steps = [
        (LeadStatus::Contacted, &counselor, ""),
        (LeadStatus::LoginReady, &counselor, ""),
        (
            LeadStatus::LoginReady,
            &admin,
            "Documents verified offline by branch team",
        ),
    ];
    for (status, actor, notes) in steps {
        let request = StatusTransitionRequest {
            lead_id: lead_id.clone(),
            status: Some(status),
            documents_status: None,
            reason_code: None,
            notes: notes.to_string(),
            additional_data: TransitionData::default(),
        };
        match lifecycle.transition(request, actor) {
            Ok(result) => {
                let remaining = result
                    .tat
                    .hours_remaining()
                    .map(|hours| format!("{hours:.0}h left"))
                    .unwrap_or_else(|| "untracked".to_string());
                println!(
                    "  {:?} moved lead to {} (v{}, TAT target {}h, {})",
                    actor.role,
                    result.lead.status_label,
                    result.lead.version,
                    result.tat.expected_hours,
                    remaining
                );
            }
            Err(err) => println!("  {:?} refused: {} [{}]", actor.role, err, err.code()),
        }
    }

    let report = lifecycle.report(100)?;
    println!("\nPipeline snapshot");
    for entry in &report.phase_counts {
        println!(
            "  - {}: {} leads ({} breached)",
            entry.phase_label, entry.leads, entry.breached
        );
    }
    for row in &report.breached {
        println!(
            "  ! {} in {} for {:.0}h (target {}h)",
            row.lead_id, row.status_label, row.hours_in_stage, row.expected_hours
        );
    }
    for row in &report.incomplete {
        println!(
            "  ? {} is {}% complete ({} required fields missing)",
            row.lead_id, row.completeness_score, row.missing_required
        );
    }

    if !skip_documents {
        run_document_queue().await;
    }

    run_lender_selection(&lead_id, &counselor, events);

    Ok(())
}

fn intake_draft() -> Result<IntakeDraft, loan_pipeline::workflows::leads::IntakeError> {
    let draft = IntakeDraft::new(DraftKey::for_phone("+91 98860 44321"));
    let draft = reduce(
        draft,
        IntakeAction::SaveStudent(StudentProfile {
            full_name: Some("Nikhil Sharma".to_string()),
            email: Some("nikhil.sharma@example.com".to_string()),
            phone: Some("+91 98860 44321".to_string()),
            pin_code: Some("411001".to_string()),
            city: Some("Pune".to_string()),
            date_of_birth: None,
        }),
    )?;
    let draft = reduce(
        draft,
        IntakeAction::SaveStudy {
            study: StudyPlan {
                study_destination: Some("Canada".to_string()),
                university_id: Some("ubc".to_string()),
                university_name: Some("University of British Columbia".to_string()),
                course_name: Some("MEng Electrical".to_string()),
                intake_month: Some(1),
                intake_year: Some(2026),
                admission_status: Some("admitted".to_string()),
            },
            loan_amount: 4_500_000,
        },
    )?;
    let draft = reduce(
        draft,
        IntakeAction::SaveCoApplicant(CoApplicant {
            id: Some("co-2001".to_string()),
            name: Some("Rekha Sharma".to_string()),
            relationship: Some("mother".to_string()),
            phone: Some("9886012345".to_string()),
            monthly_salary: Some(82_000),
            pin_code: Some("411001".to_string()),
            occupation: Some("Teacher".to_string()),
            email: None,
        }),
    )?;
    reduce(draft, IntakeAction::Submit)
}

async fn run_document_queue() {
    println!("\nDocument classification queue");
    let files = [
        ("file-1", "passport_front.jpg", Some(DocumentType::Passport)),
        ("file-2", "bank_statement_mar.pdf", Some(DocumentType::BankStatement)),
        ("file-3", "IMG_2024.png", None),
        ("file-4", "pan_card.pdf", Some(DocumentType::AadhaarCard)),
    ];
    let slots: Vec<DocumentSlot> = files
        .into_iter()
        .map(|(id, name, expected)| {
            DocumentSlot::queued(FileId::new(id), name, expected, name.as_bytes().to_vec())
        })
        .collect();

    let mut slots = classify_batch(Arc::new(FilenameClassifier), slots, Duration::from_secs(5)).await;

    for slot in &mut slots {
        match slot.state().clone() {
            SlotState::Suggested {
                classification,
                needs_attention,
            } => {
                println!(
                    "  - {} -> {} ({}%){}",
                    slot.file_name,
                    classification.detected_type_label,
                    classification.confidence,
                    if needs_attention { " needs attention" } else { "" }
                );
                // Simulated operator review: the counselor accepts clean
                // suggestions and leaves flagged ones for a manual look.
                if !needs_attention {
                    println!(
                        "    [simulated operator] counselor confirms {}",
                        classification.detected_type_label
                    );
                    if let Err(err) = slot.confirm(classification.detected_type) {
                        println!("    confirmation failed: {err}");
                    }
                }
            }
            other => println!("  - {} -> {}", slot.file_name, other.name()),
        }
    }

    let confirmed = slots
        .iter()
        .filter(|slot| matches!(slot.state(), SlotState::Confirmed { .. }))
        .count();
    println!("  {} of {} files confirmed by the operator", confirmed, slots.len());
}

fn run_lender_selection(lead_id: &LeadId, counselor: &Actor, events: Arc<InMemoryEventLog>) {
    println!("\nLender recommendations");
    let evaluation = |id: &str, name: &str, fit: u8, band, flags: &[&str]| LenderEvaluation {
        lender_id: LenderId::new(id),
        lender_name: name.to_string(),
        fit_score: fit,
        probability_band: band,
        risk_flags: flags.iter().map(|flag| flag.to_string()).collect(),
        group: None,
        justification: String::new(),
    };
    let set = RecommendationSet::new(
        lead_id.clone(),
        vec![
            evaluation("credila", "Credila", 86, ProbabilityBand::High, &[]),
            evaluation("avanse", "Avanse Financial", 81, ProbabilityBand::High, &["co_applicant_income"]),
            evaluation("auxilo", "Auxilo", 58, ProbabilityBand::Medium, &[]),
            evaluation("incred", "InCred", 34, ProbabilityBand::Low, &["destination_not_served"]),
        ],
        74,
    );

    for group in [
        LenderGroup::BestFit,
        LenderGroup::AlsoConsider,
        LenderGroup::PossibleButRisky,
        LenderGroup::NotSuitable,
    ] {
        for evaluation in set.groups.group(group) {
            println!(
                "  - {:?}: {} fit {} -> {}",
                group,
                evaluation.lender_name,
                evaluation.fit_score,
                verdict_of(evaluation).label()
            );
        }
    }

    let Some(top) = set.top_pick().map(|evaluation| evaluation.lender_id.clone()) else {
        println!("  No top pick; lead stays unassigned");
        return;
    };

    let store = Arc::new(InMemoryAcceptanceStore::default());
    let desk = AcceptanceDesk::new(store.clone(), events.clone());
    match desk.accept_top_pick(&set, &top, counselor) {
        Ok(record) => println!(
            "  Accepted {} ({:?}, review flag {})",
            record.lender_id, record.mode, record.needs_human_review
        ),
        Err(err) => println!("  Acceptance refused: {err}"),
    }
    println!(
        "  {} acceptance record(s), {} lead event(s) dispatched",
        store.records().len(),
        events.events().len()
    );
}
