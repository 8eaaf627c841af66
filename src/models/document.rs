use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::DocumentStatus;

/// The central routing aggregate: one row in `documents` plus the
/// co-executor, signature and attachment child tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Sequential code, e.g. `EDO-DOC-2026-00042`.
    pub name: String,
    pub title: String,
    pub status: DocumentStatus,
    pub brief_content: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub incoming_number: Option<String>,
    pub incoming_date: Option<NaiveDate>,
    pub outgoing_number: Option<String>,
    pub outgoing_date: Option<NaiveDate>,
    // Lookup references (names of rows in small reference tables).
    pub document_type: Option<String>,
    pub priority: Option<String>,
    pub correspondent: Option<String>,
    pub classification: Option<String>,
    pub delivery_method: Option<String>,
    // Routing assignments. The director_* and reception_* fields are only
    // ever written by workflow transitions, never by direct updates.
    pub reception_office: Option<String>,
    pub reception_user: Option<String>,
    pub reception_decision_date: Option<DateTime<Utc>>,
    pub director_user: Option<String>,
    pub director_approved: bool,
    pub director_rejected: bool,
    pub director_decision_date: Option<DateTime<Utc>>,
    pub director_comment: Option<String>,
    pub resolution: Option<String>,
    pub resolution_text: Option<String>,
    pub executor: Option<String>,
    pub co_executors: CoExecutors,
    pub signatures: Signatures,
    /// Current canonical PDF artifact (file store reference).
    pub main_document: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Set once Phase 2 of the fiska flow has stored a QR artifact.
    pub fiska_processed: bool,
    /// Optimistic concurrency counter, bumped on every persisted mutation.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Document {
    /// An empty draft in status Новый. The store assigns the sequential
    /// name on insert.
    pub fn draft(now: DateTime<Utc>) -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            status: DocumentStatus::New,
            brief_content: None,
            document_date: None,
            incoming_number: None,
            incoming_date: None,
            outgoing_number: None,
            outgoing_date: None,
            document_type: None,
            priority: None,
            correspondent: None,
            classification: None,
            delivery_method: None,
            reception_office: None,
            reception_user: None,
            reception_decision_date: None,
            director_user: None,
            director_approved: false,
            director_rejected: false,
            director_decision_date: None,
            director_comment: None,
            resolution: None,
            resolution_text: None,
            executor: None,
            co_executors: CoExecutors::new(),
            signatures: Signatures::new(),
            main_document: None,
            attachments: Vec::new(),
            fiska_processed: false,
            revision: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// Everyone whose signature is required: the primary executor followed
    /// by the co-executors, in declaration order.
    pub fn signing_principals(&self) -> Vec<&str> {
        let mut principals: Vec<&str> = Vec::new();
        if let Some(executor) = self.executor.as_deref() {
            principals.push(executor);
        }
        for user in self.co_executors.iter() {
            principals.push(user);
        }
        principals
    }

    pub fn is_signing_principal(&self, user: &str) -> bool {
        self.signing_principals().contains(&user)
    }

    /// True when every signing principal has signed.
    pub fn is_fully_signed(&self) -> bool {
        let principals = self.signing_principals();
        !principals.is_empty() && principals.iter().all(|p| self.signatures.contains(p))
    }
}

/// A stored file attached to a document: demoted main-document revisions,
/// fiska QR artifacts, supporting material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// File store reference.
    pub file: String,
    /// Display name shown on the portal.
    pub file_name: String,
}

/// Ordered co-executor list. Mutation goes through [`CoExecutors::replace`],
/// which keeps the list unique and free of the primary executor, so the
/// invariants hold no matter what the caller supplies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoExecutors(Vec<String>);

impl CoExecutors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_users(users: Vec<String>, executor: Option<&str>) -> Self {
        let mut list = Self::new();
        list.replace(users, executor);
        list
    }

    /// Full-replace semantics: the supplied list becomes the new content,
    /// deduplicated in first-seen order, with the primary executor dropped.
    pub fn replace(&mut self, users: Vec<String>, executor: Option<&str>) {
        self.0.clear();
        for user in users {
            if Some(user.as_str()) == executor {
                continue;
            }
            if !self.0.contains(&user) {
                self.0.push(user);
            }
        }
    }

    /// Re-apply the executor exclusion after the primary executor changed.
    pub fn exclude(&mut self, executor: &str) {
        self.0.retain(|u| u != executor);
    }

    pub fn contains(&self, user: &str) -> bool {
        self.0.iter().any(|u| u == user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// One signoff by a signing principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub user: String,
    pub signed_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Signature list holding at most one entry per principal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signatures(Vec<SignatureEntry>);

impl Signatures {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_entries(entries: Vec<SignatureEntry>) -> Self {
        let mut signatures = Self::new();
        for entry in entries {
            signatures.try_add(entry);
        }
        signatures
    }

    pub fn contains(&self, user: &str) -> bool {
        self.0.iter().any(|s| s.user == user)
    }

    /// Append an entry unless the principal already signed.
    /// Returns false (and leaves the list unchanged) on a duplicate.
    pub fn try_add(&mut self, entry: SignatureEntry) -> bool {
        if self.contains(&entry.user) {
            return false;
        }
        self.0.push(entry);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignatureEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[SignatureEntry] {
        &self.0
    }
}
