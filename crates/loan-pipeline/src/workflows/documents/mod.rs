//! Per-file document classification queue.
//!
//! Every uploaded file owns a [`DocumentSlot`]. The AI classifier only ever
//! suggests a type; a human confirms it.

pub mod classifier;
pub mod domain;

pub use classifier::{classify_batch, ClassificationRequest, ClassifierError, DocumentClassifier};
pub use domain::{
    Classification, DocumentSlot, DocumentType, FileId, ManualTypeReason, SlotError, SlotState,
    ATTENTION_CONFIDENCE,
};
