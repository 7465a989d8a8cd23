use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::domain::{
    Classification, DocumentSlot, DocumentType, FileId, ManualTypeReason, SlotState,
};

pub struct ClassificationRequest {
    pub file_id: FileId,
    pub file_name: String,
    pub content: Arc<[u8]>,
    pub expected_type: Option<DocumentType>,
}

/// External AI document classifier.
#[async_trait]
pub trait DocumentClassifier: Send + Sync {
    /// `Ok(None)` means the service answered without a usable suggestion.
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<Option<Classification>, ClassifierError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Classify every queued slot concurrently.
///
/// Each file is independent: a failure, timeout or panic for one file moves
/// only that slot to `ManualTypeRequired`. Slots that are not queued are
/// returned untouched, in their original order.
pub async fn classify_batch<C>(
    classifier: Arc<C>,
    mut slots: Vec<DocumentSlot>,
    per_file_timeout: Duration,
) -> Vec<DocumentSlot>
where
    C: DocumentClassifier + ?Sized + 'static,
{
    let mut tasks = JoinSet::new();

    for (index, slot) in slots.iter_mut().enumerate() {
        let Some(content) = slot.content() else {
            continue;
        };
        if slot.start_classifying().is_err() {
            continue;
        }

        let request = ClassificationRequest {
            file_id: slot.file_id.clone(),
            file_name: slot.file_name.clone(),
            content,
            expected_type: slot.expected_type,
        };
        let classifier = classifier.clone();
        tasks.spawn(async move {
            let outcome =
                match tokio::time::timeout(per_file_timeout, classifier.classify(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(ClassifierError::Timeout(per_file_timeout)),
                };
            (index, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            Err(error) => {
                warn!(%error, "classification task aborted");
                continue;
            }
        };
        let Some(slot) = slots.get_mut(index) else {
            continue;
        };

        let applied = match outcome {
            Ok(suggestion) => {
                debug!(file_id = %slot.file_id, suggested = suggestion.is_some(), "document classified");
                slot.record_suggestion(suggestion)
            }
            Err(error) => {
                warn!(file_id = %slot.file_id, %error, "classification failed; manual type required");
                slot.require_manual_type(ManualTypeReason::ClassifierUnavailable(error.to_string()))
            }
        };
        if let Err(error) = applied {
            debug!(file_id = %slot.file_id, %error, "classification result discarded");
        }
    }

    // Tasks that died without reporting leave their slot classifying.
    for slot in slots.iter_mut() {
        if matches!(slot.state(), SlotState::Classifying) {
            let _ = slot.require_manual_type(ManualTypeReason::ClassifierUnavailable(
                "classification task did not complete".to_string(),
            ));
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers by file name so each test controls every file independently.
    struct ScriptedClassifier;

    #[async_trait]
    impl DocumentClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            request: ClassificationRequest,
        ) -> Result<Option<Classification>, ClassifierError> {
            match request.file_name.as_str() {
                "offline.pdf" => Err(ClassifierError::Unavailable("503 from classifier".to_string())),
                "slow.pdf" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
                "blank.pdf" => Ok(None),
                "panic.pdf" => panic!("classifier bug"),
                _ => Ok(Some(Classification {
                    detected_type: DocumentType::Passport,
                    detected_type_label: "Passport".to_string(),
                    confidence: 91,
                    quality_assessment: Some("clear".to_string()),
                    red_flags: Vec::new(),
                    notes: None,
                })),
            }
        }
    }

    fn slot(id: &str, name: &str) -> DocumentSlot {
        DocumentSlot::queued(
            FileId::new(id),
            name,
            Some(DocumentType::Passport),
            vec![0_u8; 8],
        )
    }

    fn state_names(slots: &[DocumentSlot]) -> Vec<&'static str> {
        slots.iter().map(|slot| slot.state().name()).collect()
    }

    #[tokio::test]
    async fn one_failing_file_does_not_affect_the_others() {
        let slots = vec![
            slot("f-1", "passport.pdf"),
            slot("f-2", "offline.pdf"),
            slot("f-3", "passport-back.pdf"),
        ];

        let slots = classify_batch(Arc::new(ScriptedClassifier), slots, Duration::from_secs(5)).await;

        assert_eq!(
            state_names(&slots),
            vec!["suggested", "manual_type_required", "suggested"]
        );
        assert!(matches!(
            slots[1].state(),
            SlotState::ManualTypeRequired {
                reason: ManualTypeReason::ClassifierUnavailable(_)
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_files_time_out_into_manual_typing() {
        let slots = vec![slot("f-1", "slow.pdf"), slot("f-2", "passport.pdf")];

        let slots =
            classify_batch(Arc::new(ScriptedClassifier), slots, Duration::from_millis(200)).await;

        assert_eq!(state_names(&slots), vec!["manual_type_required", "suggested"]);
    }

    #[tokio::test]
    async fn empty_answers_and_panics_degrade_to_manual_typing() {
        let slots = vec![slot("f-1", "blank.pdf"), slot("f-2", "panic.pdf")];

        let slots = classify_batch(Arc::new(ScriptedClassifier), slots, Duration::from_secs(5)).await;

        assert_eq!(
            slots[0].state(),
            &SlotState::ManualTypeRequired {
                reason: ManualTypeReason::NoClassification
            }
        );
        assert_eq!(slots[1].state().name(), "manual_type_required");
    }

    #[tokio::test]
    async fn removed_slots_are_skipped() {
        let mut removed = slot("f-1", "passport.pdf");
        removed.remove().expect("queued slot is removable");
        let slots = vec![removed, slot("f-2", "passport.pdf")];

        let slots = classify_batch(Arc::new(ScriptedClassifier), slots, Duration::from_secs(5)).await;

        assert_eq!(state_names(&slots), vec!["removed", "suggested"]);
    }
}
