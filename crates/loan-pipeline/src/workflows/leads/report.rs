use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::completion::CompletionEvaluator;
use super::domain::{Lead, LeadId, LeadStatus, Phase};
use super::registry::StatusRegistry;
use super::transition::tat;

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCountEntry {
    pub phase: Phase,
    pub phase_label: &'static str,
    pub leads: usize,
    pub breached: usize,
}

/// One list-view row: where the lead is, how long it has been there, how complete it is.
#[derive(Debug, Clone, Serialize)]
pub struct LeadAnnotation {
    pub lead_id: LeadId,
    pub status: LeadStatus,
    pub status_label: &'static str,
    pub hours_in_stage: f64,
    pub expected_hours: u32,
    pub completeness_score: u8,
    pub missing_required: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PipelineReport {
    pub phase_counts: Vec<PhaseCountEntry>,
    pub breached: Vec<LeadAnnotation>,
    pub warning: Vec<LeadAnnotation>,
    pub incomplete: Vec<LeadAnnotation>,
}

impl PipelineReport {
    pub fn build(leads: &[Lead], now: DateTime<Utc>) -> Self {
        let mut report = PipelineReport::default();
        let mut counts: HashMap<Phase, (usize, usize)> = HashMap::new();

        for lead in leads {
            let entry = StatusRegistry::entry(lead.status);
            let tat = tat::compute(lead.status, lead.stage_started_at, now);
            let completion = CompletionEvaluator::evaluate(lead);

            let count = counts.entry(entry.phase).or_default();
            count.0 += 1;
            if tat.is_breached {
                count.1 += 1;
            }

            let annotation = LeadAnnotation {
                lead_id: lead.id.clone(),
                status: lead.status,
                status_label: entry.label,
                hours_in_stage: tat.hours_in_stage,
                expected_hours: tat.expected_hours,
                completeness_score: completion.completeness_score,
                missing_required: completion.missing_required.len(),
            };

            if !completion.is_complete && !entry.is_terminal() {
                report.incomplete.push(annotation.clone());
            }

            if tat.is_breached {
                report.breached.push(annotation);
            } else if tat.is_warning {
                report.warning.push(annotation);
            }
        }

        report.phase_counts = Phase::ordered()
            .into_iter()
            .filter_map(|phase| {
                counts.get(&phase).map(|(leads, breached)| PhaseCountEntry {
                    phase,
                    phase_label: phase.label(),
                    leads: *leads,
                    breached: *breached,
                })
            })
            .collect();

        let by_age_desc =
            |a: &LeadAnnotation, b: &LeadAnnotation| b.hours_in_stage.total_cmp(&a.hours_in_stage);
        report.breached.sort_by(by_age_desc);
        report.warning.sort_by(by_age_desc);
        report.incomplete.sort_by(by_age_desc);

        report
    }
}
