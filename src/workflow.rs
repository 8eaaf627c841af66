//! Document lifecycle state machine.
//!
//! Новый → На рассмотрении → {На исполнении | Согласован | Отказан},
//! На исполнении → Выполнено once every signing principal has signed.
//!
//! Transitions are pure functions over a loaded aggregate: all required
//! context (office, clock, caller) arrives as arguments and the service
//! layer persists the mutated document afterwards. Status and the other
//! protected fields are only ever written here; the update commands in
//! this module cannot express them, and unknown fields are rejected at
//! the serialization boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::enums::DocumentStatus;
use crate::models::{Document, ReceptionOffice, SignatureEntry};

// ═══════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Cannot {action} a document in status '{}'", .from.as_str())]
    InvalidTransition {
        from: DocumentStatus,
        action: &'static str,
    },
    #[error("Provide exactly one of resolution or resolution text")]
    ResolutionChoice,
    #[error("Reception office '{office}' has no director configured")]
    OfficeWithoutDirector { office: String },
    #[error("Approval requires the processed signed routing sheet; complete the fiska flow first")]
    FiskaNotProcessed,
    #[error("User '{user}' is not an executor of this document")]
    NotSigningPrincipal { user: String },
    #[error("User '{user}' has already signed this document")]
    AlreadySigned { user: String },
    #[error("Document title must not be empty")]
    TitleRequired,
}

// ═══════════════════════════════════════════
// Update commands
// ═══════════════════════════════════════════

/// Reception routing payload. Exactly one of `resolution` (template
/// reference) or `resolution_text` (free form) must be provided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceptionSubmission {
    pub reception_office: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub resolution_text: Option<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub co_executors: Vec<String>,
}

/// Full replacement of the descriptive metadata block. Routing and
/// workflow fields are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentUpdate {
    pub title: String,
    #[serde(default)]
    pub brief_content: Option<String>,
    #[serde(default)]
    pub document_date: Option<NaiveDate>,
    #[serde(default)]
    pub incoming_number: Option<String>,
    #[serde(default)]
    pub incoming_date: Option<NaiveDate>,
    #[serde(default)]
    pub outgoing_number: Option<String>,
    #[serde(default)]
    pub outgoing_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub correspondent: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub delivery_method: Option<String>,
}

/// Full replacement of the routing quartet, for the assigned director
/// while the document is under review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingUpdate {
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub resolution_text: Option<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub co_executors: Vec<String>,
}

// ═══════════════════════════════════════════
// Transitions
// ═══════════════════════════════════════════

/// Новый → На рассмотрении. Routes the document to the director of the
/// submitted reception office.
pub fn submit_to_director(
    doc: &mut Document,
    submission: ReceptionSubmission,
    office: &ReceptionOffice,
    submitted_by: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if doc.status != DocumentStatus::New {
        return Err(WorkflowError::InvalidTransition {
            from: doc.status,
            action: "submit",
        });
    }
    let (resolution, resolution_text) =
        exactly_one_resolution(submission.resolution, submission.resolution_text)?;
    let director = office
        .director
        .clone()
        .ok_or_else(|| WorkflowError::OfficeWithoutDirector {
            office: office.name.clone(),
        })?;

    doc.reception_office = Some(office.name.clone());
    doc.reception_user = Some(submitted_by.to_string());
    doc.reception_decision_date = Some(now);
    doc.resolution = resolution;
    doc.resolution_text = resolution_text;
    doc.director_user = Some(director);
    if submission.executor.is_some() {
        doc.executor = submission.executor;
    }
    let executor = doc.executor.clone();
    doc.co_executors
        .replace(submission.co_executors, executor.as_deref());
    doc.status = DocumentStatus::UnderReview;
    Ok(())
}

/// На рассмотрении → На исполнении (executor assigned) or Согласован.
/// Refused until the signed routing sheet has been processed.
pub fn director_approve(
    doc: &mut Document,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if doc.status != DocumentStatus::UnderReview {
        return Err(WorkflowError::InvalidTransition {
            from: doc.status,
            action: "approve",
        });
    }
    if !doc.fiska_processed {
        return Err(WorkflowError::FiskaNotProcessed);
    }

    doc.director_approved = true;
    doc.director_rejected = false;
    doc.director_decision_date = Some(now);
    doc.director_comment = normalize(comment);
    doc.status = if doc.executor.is_some() {
        DocumentStatus::InExecution
    } else {
        DocumentStatus::Approved
    };
    Ok(())
}

/// На рассмотрении → Отказан.
pub fn director_reject(
    doc: &mut Document,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if doc.status != DocumentStatus::UnderReview {
        return Err(WorkflowError::InvalidTransition {
            from: doc.status,
            action: "reject",
        });
    }

    doc.director_rejected = true;
    doc.director_approved = false;
    doc.director_decision_date = Some(now);
    doc.director_comment = normalize(comment);
    doc.status = DocumentStatus::Rejected;
    Ok(())
}

/// Record one principal's signature. Moves to Выполнено when the
/// signature set is now complete. Re-signing is rejected.
pub fn executor_sign(
    doc: &mut Document,
    user: &str,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if doc.status != DocumentStatus::InExecution {
        return Err(WorkflowError::InvalidTransition {
            from: doc.status,
            action: "sign",
        });
    }
    if !doc.is_signing_principal(user) {
        return Err(WorkflowError::NotSigningPrincipal { user: user.into() });
    }
    let added = doc.signatures.try_add(SignatureEntry {
        user: user.to_string(),
        signed_at: now,
        comment: normalize(comment),
    });
    if !added {
        return Err(WorkflowError::AlreadySigned { user: user.into() });
    }
    if doc.is_fully_signed() {
        doc.status = DocumentStatus::Completed;
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Updates
// ═══════════════════════════════════════════

/// Replace the descriptive metadata block.
pub fn apply_update(doc: &mut Document, update: DocumentUpdate) -> Result<(), WorkflowError> {
    if update.title.trim().is_empty() {
        return Err(WorkflowError::TitleRequired);
    }
    doc.title = update.title;
    doc.brief_content = update.brief_content;
    doc.document_date = update.document_date;
    doc.incoming_number = update.incoming_number;
    doc.incoming_date = update.incoming_date;
    doc.outgoing_number = update.outgoing_number;
    doc.outgoing_date = update.outgoing_date;
    doc.document_type = update.document_type;
    doc.priority = update.priority;
    doc.correspondent = update.correspondent;
    doc.classification = update.classification;
    doc.delivery_method = update.delivery_method;
    Ok(())
}

/// Replace the routing quartet. Keeps the resolution choice exclusive
/// and the co-executor list free of the primary executor.
pub fn apply_routing_update(doc: &mut Document, update: RoutingUpdate) -> Result<(), WorkflowError> {
    let (resolution, resolution_text) =
        exactly_one_resolution(update.resolution, update.resolution_text)?;
    doc.resolution = resolution;
    doc.resolution_text = resolution_text;
    doc.executor = update.executor;
    let executor = doc.executor.clone();
    doc.co_executors
        .replace(update.co_executors, executor.as_deref());
    Ok(())
}

fn exactly_one_resolution(
    resolution: Option<String>,
    resolution_text: Option<String>,
) -> Result<(Option<String>, Option<String>), WorkflowError> {
    let resolution = normalize(resolution);
    let resolution_text = normalize(resolution_text);
    match (&resolution, &resolution_text) {
        (Some(_), None) | (None, Some(_)) => Ok((resolution, resolution_text)),
        _ => Err(WorkflowError::ResolutionChoice),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
