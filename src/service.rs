//! Document service: the public operation surface of the routing core.
//!
//! Every operation takes the acting principal's user id. The service
//! resolves the principal's context from the directory, gates the action
//! through the access policy, runs the workflow or engine logic, persists
//! the aggregate under the optimistic revision check, and returns the
//! refreshed state. Denied reads surface as NotFound so callers cannot
//! probe for the existence of documents outside their scope; denied
//! mutations surface as Authorization.

use std::collections::HashMap;

use base64::Engine as _;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::access::{self, Action, PrincipalContext};
use crate::db::{self, DatabaseError, DocumentFilters, DocumentSummary};
use crate::files::{FileError, FileStore};
use crate::gateway::{ErrorOrigin, FiskaRequest, GatewayError, SignMetadata, SignatureGateway};
use crate::models::{Attachment, Document, ResolutionTemplate, Stamp, UserProfile};
use crate::stamping::{
    self, DisplayLookups, PdfInfo, PlacementFailure, StampAsset, StampEngine, StampError,
    StampPlacement,
};
use crate::workflow::{self, DocumentUpdate, ReceptionSubmission, RoutingUpdate, WorkflowError};

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum EdoError {
    /// Denied mutation. Every denial renders the same message, whatever
    /// the cause.
    #[error("Access denied")]
    Authorization,

    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Document {name} was modified concurrently, reload and retry")]
    Conflict { name: String },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error("File error: {0}")]
    Files(#[from] FileError),

    #[error("Signature service error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Stamp engine error: {0}")]
    Stamping(#[from] StampError),
}

impl EdoError {
    /// Which side of the wire a gateway failure originated on, for the
    /// portal's error toasts. `None` for non-gateway errors.
    pub fn gateway_origin(&self) -> Option<ErrorOrigin> {
        match self {
            EdoError::Gateway(e) => Some(e.origin()),
            _ => None,
        }
    }
}

/// Outcome of `apply_stamps`: the refreshed document plus which
/// placements landed and which were skipped.
#[derive(Debug, Serialize)]
pub struct ApplyStampsReport {
    pub document: Document,
    pub applied: Vec<StampPlacement>,
    pub failed: Vec<PlacementFailure>,
    pub new_file_url: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// Service
// ═══════════════════════════════════════════════════════════════════════════

pub struct EdoService {
    conn: Connection,
    files: Box<dyn FileStore>,
    gateway: Box<dyn SignatureGateway>,
    engine: StampEngine,
}

impl EdoService {
    pub fn new(
        conn: Connection,
        files: Box<dyn FileStore>,
        gateway: Box<dyn SignatureGateway>,
        engine: StampEngine,
    ) -> Self {
        Self { conn, files, gateway, engine }
    }

    // ── Documents ──────────────────────────────────────────────────────

    /// Register a new document in status Новый with a sequential name.
    pub fn create_document(&mut self, user: &str, draft: DocumentUpdate) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        self.require(access::can_create(&ctx))?;

        let mut doc = Document::draft(Utc::now());
        workflow::apply_update(&mut doc, draft)?;
        db::insert_document(&mut self.conn, &mut doc)?;

        tracing::info!(document = %doc.name, by = %ctx.user, "Document created");
        Ok(doc)
    }

    /// Store `content` and make it the document's main PDF. Used when the
    /// scan arrives; later stamping and signing replace it through their
    /// own flows.
    pub fn attach_main_document(
        &mut self,
        user: &str,
        name: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::EditFull, &doc))?;

        let stored = self.files.save(file_name, content, true)?;
        doc.main_document = Some(stored.url.clone());
        let refreshed = self.persist(&doc)?;

        tracing::info!(document = %refreshed.name, url = %stored.url, "Main document attached");
        Ok(refreshed)
    }

    /// Visibility-gated read.
    pub fn get_document(&self, user: &str, name: &str) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        self.load_visible(&ctx, name)
    }

    /// Scoped listing with optional filters.
    pub fn list_documents(
        &self,
        user: &str,
        filters: &DocumentFilters,
    ) -> Result<Vec<DocumentSummary>, EdoError> {
        let ctx = self.principal(user)?;
        let scope = access::visibility_scope(&ctx);
        Ok(db::list_documents(&self.conn, &scope, filters)?)
    }

    /// Replace the descriptive metadata block, per the edit rules.
    pub fn update_document(
        &mut self,
        user: &str,
        name: &str,
        update: DocumentUpdate,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::EditFull, &doc))?;

        workflow::apply_update(&mut doc, update)?;
        self.persist(&doc)
    }

    /// Replace the routing quartet while the document is under review.
    pub fn update_routing(
        &mut self,
        user: &str,
        name: &str,
        update: RoutingUpdate,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::EditRouting, &doc))?;

        workflow::apply_routing_update(&mut doc, update)?;
        self.persist(&doc)
    }

    // ── Workflow transitions ───────────────────────────────────────────

    /// Новый → На рассмотрении: reception routes the document to the
    /// director of the chosen office.
    pub fn reception_submit(
        &mut self,
        user: &str,
        name: &str,
        submission: ReceptionSubmission,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::SubmitToDirector, &doc))?;

        let office = db::get_office(&self.conn, &submission.reception_office)?.ok_or_else(|| {
            EdoError::NotFound {
                entity_type: "Reception office".into(),
                id: submission.reception_office.clone(),
            }
        })?;
        workflow::submit_to_director(&mut doc, submission, &office, &ctx.user, Utc::now())?;
        let refreshed = self.persist(&doc)?;

        tracing::info!(
            document = %refreshed.name,
            office = %office.name,
            director = refreshed.director_user.as_deref().unwrap_or(""),
            "Document submitted to director"
        );
        Ok(refreshed)
    }

    /// На рассмотрении → На исполнении / Согласован. Requires a processed
    /// fiska signature.
    pub fn director_approve(
        &mut self,
        user: &str,
        name: &str,
        comment: Option<String>,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::DirectorApprove, &doc))?;

        workflow::director_approve(&mut doc, comment, Utc::now())?;
        let refreshed = self.persist(&doc)?;

        tracing::info!(document = %refreshed.name, status = refreshed.status.as_str(), "Director approved");
        Ok(refreshed)
    }

    /// На рассмотрении → Отказан.
    pub fn director_reject(
        &mut self,
        user: &str,
        name: &str,
        comment: Option<String>,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::DirectorReject, &doc))?;

        workflow::director_reject(&mut doc, comment, Utc::now())?;
        let refreshed = self.persist(&doc)?;

        tracing::info!(document = %refreshed.name, "Director rejected");
        Ok(refreshed)
    }

    /// Record the caller's signature; the last required signature moves
    /// the document to Выполнено.
    pub fn executor_sign(
        &mut self,
        user: &str,
        name: &str,
        comment: Option<String>,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::ExecutorSign, &doc))?;

        workflow::executor_sign(&mut doc, &ctx.user, comment, Utc::now())?;
        let refreshed = self.persist(&doc)?;

        tracing::info!(
            document = %refreshed.name,
            by = %ctx.user,
            status = refreshed.status.as_str(),
            "Executor signed"
        );
        Ok(refreshed)
    }

    // ── Predicates for UI gating ───────────────────────────────────────

    /// Without a name: may the user create documents at all. With one:
    /// may they edit that document's metadata.
    pub fn can_edit_document(&self, user: &str, name: Option<&str>) -> Result<bool, EdoError> {
        let Some(ctx) = self.principal_opt(user)? else {
            return Ok(false);
        };
        match name {
            None => Ok(access::can_create(&ctx).allowed),
            Some(name) => match db::get_document(&self.conn, name)? {
                Some(doc) => Ok(access::evaluate(&ctx, Action::Read, &doc).allowed
                    && access::evaluate(&ctx, Action::EditFull, &doc).allowed),
                None => Ok(false),
            },
        }
    }

    pub fn can_reception_submit(&self, user: &str) -> Result<bool, EdoError> {
        let Some(ctx) = self.principal_opt(user)? else {
            return Ok(false);
        };
        Ok(access::can_submit_any(&ctx).allowed)
    }

    pub fn can_director_approve(&self, user: &str, name: &str) -> Result<bool, EdoError> {
        let Some(ctx) = self.principal_opt(user)? else {
            return Ok(false);
        };
        match db::get_document(&self.conn, name)? {
            Some(doc) => Ok(access::evaluate(&ctx, Action::DirectorApprove, &doc).allowed),
            None => Ok(false),
        }
    }

    /// True while the caller is a signing principal who has not signed yet.
    pub fn can_executor_sign(&self, user: &str, name: &str) -> Result<bool, EdoError> {
        let Some(ctx) = self.principal_opt(user)? else {
            return Ok(false);
        };
        match db::get_document(&self.conn, name)? {
            Some(doc) => Ok(access::evaluate(&ctx, Action::ExecutorSign, &doc).allowed
                && !doc.signatures.contains(&ctx.user)),
            None => Ok(false),
        }
    }

    // ── Stamps ─────────────────────────────────────────────────────────

    /// Composite stamps onto the main PDF. The stamped file becomes the
    /// new main document; the prior version is demoted to the attachment
    /// list under a content-hash-suffixed name.
    pub fn apply_stamps(
        &mut self,
        user: &str,
        name: &str,
        placements: Vec<StampPlacement>,
    ) -> Result<ApplyStampsReport, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::ApplyStamps, &doc))?;

        let main_url = doc
            .main_document
            .clone()
            .ok_or_else(|| EdoError::Validation("document has no main PDF to stamp".into()))?;
        let pdf_bytes = self.files.read(&main_url)?;

        let assets = self.stamp_assets(&placements)?;
        let values = stamping::document_field_values(&doc, &self.display_lookups(&doc)?);
        let outcome = self.engine.apply_stamps(&pdf_bytes, &placements, &assets, &values)?;

        let stored = self
            .files
            .save(&stored_display_name(&main_url), &outcome.pdf_bytes, true)?;
        demote_prior_main(&mut doc, &main_url, &pdf_bytes);
        doc.main_document = Some(stored.url.clone());
        let document = self.persist(&doc)?;

        tracing::info!(
            document = %document.name,
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            "Stamps applied"
        );
        Ok(ApplyStampsReport {
            document,
            applied: outcome.applied,
            failed: outcome.failed,
            new_file_url: stored.url,
        })
    }

    /// Page count and dimensions of the main PDF, for the placement editor.
    pub fn pdf_info(&self, user: &str, name: &str) -> Result<PdfInfo, EdoError> {
        let ctx = self.principal(user)?;
        let doc = self.load_visible(&ctx, name)?;
        let main_url = doc
            .main_document
            .ok_or_else(|| EdoError::Validation("document has no main PDF".into()))?;
        let pdf_bytes = self.files.read(&main_url)?;
        Ok(stamping::pdf_info(&pdf_bytes)?)
    }

    /// PNG preview of a stamp. With a document, live field values render;
    /// without one, «label» placeholders.
    pub fn stamp_preview(
        &self,
        user: &str,
        stamp_name: &str,
        document: Option<&str>,
    ) -> Result<Vec<u8>, EdoError> {
        let ctx = self.principal(user)?;
        let stamp = db::get_stamp(&self.conn, stamp_name)?.ok_or_else(|| EdoError::NotFound {
            entity_type: "Stamp".into(),
            id: stamp_name.into(),
        })?;
        let image_url = stamp
            .stamp_image
            .as_deref()
            .ok_or_else(|| EdoError::Validation("stamp has no image".into()))?;
        let asset = StampAsset {
            image_bytes: self.files.read(image_url)?,
            field_mappings: stamp.field_mappings.clone(),
        };

        let values = match document {
            Some(name) => {
                let doc = self.load_visible(&ctx, name)?;
                Some(stamping::document_field_values(&doc, &self.display_lookups(&doc)?))
            }
            None => None,
        };
        Ok(self.engine.render_stamp_preview(&asset, values.as_ref())?)
    }

    /// Active stamps with their field mappings, for the placement editor.
    pub fn list_stamps(&self, user: &str) -> Result<Vec<Stamp>, EdoError> {
        self.principal(user)?;
        Ok(db::list_stamps(&self.conn, true)?)
    }

    // ── Signature gateway ──────────────────────────────────────────────

    /// Phase 1: assemble the routing payload and fetch the unsigned fiska
    /// sheet (base64 PDF) for out-of-band signing.
    pub fn generate_fiska(&self, user: &str, name: &str) -> Result<String, EdoError> {
        let ctx = self.principal(user)?;
        let doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::GenerateFiska, &doc))?;

        let request = self.fiska_request(&doc)?;
        let pdf_base64 = self.gateway.generate_fiska_pdf(&request)?;

        tracing::info!(
            document = %doc.name,
            executors = request.executor_names.len(),
            "Fiska sheet generated"
        );
        Ok(pdf_base64)
    }

    /// Phase 2: exchange the signed sheet for the QR artifact, attach it,
    /// and mark the document fiska-processed. A repeated exchange of the
    /// same bytes replaces the earlier attachment instead of stacking up.
    pub fn process_signed_fiska(
        &mut self,
        user: &str,
        name: &str,
        signed_pdf_base64: &str,
        pkcs7_base64: &str,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::ProcessSignedFiska, &doc))?;

        let artifact = self
            .gateway
            .process_signed_fiska(signed_pdf_base64, pkcs7_base64)?;
        let artifact_bytes = decode_artifact_pdf(&artifact.pdf_base64)?;

        let hash8 = content_hash8(&artifact_bytes);
        let file_name = format!("fiska_{hash8}_{}.pdf", doc.name);
        let stored = self.files.save(&file_name, &artifact_bytes, true)?;
        doc.attachments.retain(|a| !a.file_name.contains(&hash8));
        doc.attachments.push(Attachment { file: stored.url, file_name });
        doc.fiska_processed = true;
        let refreshed = self.persist(&doc)?;

        tracing::info!(
            document = %refreshed.name,
            url = %artifact.verification_url,
            "Fiska signature processed"
        );
        Ok(refreshed)
    }

    /// PKCS7 variant: the signed PDF replaces the main document and the
    /// prior version is archived to the attachment list.
    pub fn sign_with_pkcs7(
        &mut self,
        user: &str,
        name: &str,
        pkcs7_base64: &str,
    ) -> Result<Document, EdoError> {
        let ctx = self.principal(user)?;
        let mut doc = self.load_visible(&ctx, name)?;
        self.require(access::evaluate(&ctx, Action::SignPkcs7, &doc))?;

        let prior_url = doc
            .main_document
            .clone()
            .ok_or_else(|| EdoError::Validation("document has no main PDF to sign".into()))?;
        let prior_bytes = self.files.read(&prior_url)?;
        let pdf_base64 = base64::engine::general_purpose::STANDARD.encode(&prior_bytes);
        let metadata = SignMetadata {
            document_name: doc.name.clone(),
            title: doc.title.clone(),
            signed_by: ctx.user.clone(),
        };
        let artifact = self.gateway.sign_pdf(&pdf_base64, pkcs7_base64, &metadata)?;
        let signed_bytes = decode_artifact_pdf(&artifact.pdf_base64)?;

        let stored = self
            .files
            .save(&stored_display_name(&prior_url), &signed_bytes, true)?;
        demote_prior_main(&mut doc, &prior_url, &prior_bytes);
        doc.main_document = Some(stored.url);
        let refreshed = self.persist(&doc)?;

        tracing::info!(
            document = %refreshed.name,
            by = %ctx.user,
            url = %artifact.verification_url,
            "Main document signed with PKCS7"
        );
        Ok(refreshed)
    }

    // ── Directory ──────────────────────────────────────────────────────

    /// Enabled users for the assignment pickers.
    pub fn list_users(&self, user: &str) -> Result<Vec<UserProfile>, EdoError> {
        self.principal(user)?;
        Ok(db::list_users(&self.conn)?)
    }

    /// Active resolution templates for the routing editor.
    pub fn list_resolutions(&self, user: &str) -> Result<Vec<ResolutionTemplate>, EdoError> {
        self.principal(user)?;
        Ok(db::list_resolutions(&self.conn)?)
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Resolve the caller into a principal context. Unknown or disabled
    /// users are denied outright.
    fn principal(&self, user: &str) -> Result<PrincipalContext, EdoError> {
        self.principal_opt(user)?.ok_or(EdoError::Authorization)
    }

    fn principal_opt(&self, user: &str) -> Result<Option<PrincipalContext>, EdoError> {
        let Some(profile) = db::get_user(&self.conn, user)?.filter(|p| p.enabled) else {
            return Ok(None);
        };
        Ok(Some(PrincipalContext {
            user: profile.name,
            roles: profile.roles,
            member_offices: db::offices_with_member(&self.conn, user)?,
            directed_offices: db::offices_directed_by(&self.conn, user)?,
        }))
    }

    fn require(&self, decision: access::AccessDecision) -> Result<(), EdoError> {
        if decision.allowed {
            Ok(())
        } else {
            Err(EdoError::Authorization)
        }
    }

    /// Load a document the caller is allowed to read. Both a missing
    /// document and a denied read come back as NotFound.
    fn load_visible(&self, ctx: &PrincipalContext, name: &str) -> Result<Document, EdoError> {
        let doc = db::get_document(&self.conn, name)?.ok_or_else(|| document_not_found(name))?;
        if !access::evaluate(ctx, Action::Read, &doc).allowed {
            return Err(document_not_found(name));
        }
        Ok(doc)
    }

    /// Save under the revision check and return the stored aggregate.
    fn persist(&mut self, doc: &Document) -> Result<Document, EdoError> {
        match db::save_document(&mut self.conn, doc) {
            Ok(_) => {}
            Err(DatabaseError::Conflict { id, .. }) => {
                return Err(EdoError::Conflict { name: id });
            }
            Err(e) => return Err(e.into()),
        }
        db::get_document(&self.conn, &doc.name)?.ok_or_else(|| document_not_found(&doc.name))
    }

    /// Load image bytes and mappings for every distinct stamp named by the
    /// placements. Missing or imageless stamps are left out; the engine
    /// reports those placements as failed.
    fn stamp_assets(
        &self,
        placements: &[StampPlacement],
    ) -> Result<HashMap<String, StampAsset>, EdoError> {
        let mut assets = HashMap::new();
        for placement in placements {
            if assets.contains_key(&placement.stamp_name) {
                continue;
            }
            let Some(stamp) = db::get_stamp(&self.conn, &placement.stamp_name)? else {
                tracing::warn!(stamp = %placement.stamp_name, "Requested stamp does not exist");
                continue;
            };
            let Some(image_url) = stamp.stamp_image.as_deref() else {
                tracing::warn!(stamp = %stamp.name, "Stamp has no image");
                continue;
            };
            match self.files.read(image_url) {
                Ok(image_bytes) => {
                    assets.insert(
                        placement.stamp_name.clone(),
                        StampAsset { image_bytes, field_mappings: stamp.field_mappings },
                    );
                }
                Err(e) => {
                    tracing::warn!(stamp = %stamp.name, error = %e, "Stamp image unreadable");
                }
            }
        }
        Ok(assets)
    }

    /// Display names for the references the document carries, used when
    /// rendering field-mapping text.
    fn display_lookups(&self, doc: &Document) -> Result<DisplayLookups, EdoError> {
        let mut lookups = DisplayLookups::default();

        let mut users: Vec<&str> = Vec::new();
        users.extend(doc.reception_user.as_deref());
        users.extend(doc.director_user.as_deref());
        users.extend(doc.executor.as_deref());
        users.extend(doc.co_executors.iter());
        for user in users {
            if lookups.users.contains_key(user) {
                continue;
            }
            if let Some(profile) = db::get_user(&self.conn, user)? {
                lookups.users.insert(user.to_string(), profile.full_name);
            }
        }
        if let Some(office) = doc.reception_office.as_deref() {
            if let Some(row) = db::get_office(&self.conn, office)? {
                lookups.offices.insert(office.to_string(), row.office_name);
            }
        }
        if let Some(resolution) = doc.resolution.as_deref() {
            if let Some(template) = db::get_resolution(&self.conn, resolution)? {
                lookups
                    .resolutions
                    .insert(resolution.to_string(), template.display_text().to_string());
            }
        }
        Ok(lookups)
    }

    /// Routing payload for the fiska sheet: resolution text, director and
    /// executor display names, with co-executors ordered by their fiska
    /// priority (ties keep declaration order).
    fn fiska_request(&self, doc: &Document) -> Result<FiskaRequest, EdoError> {
        let resolution = match (doc.resolution.as_deref(), doc.resolution_text.as_deref()) {
            (Some(name), _) => match db::get_resolution(&self.conn, name)? {
                Some(template) => template.display_text().to_string(),
                None => name.to_string(),
            },
            (None, Some(text)) => text.to_string(),
            (None, None) => {
                return Err(EdoError::Validation(
                    "document carries no resolution to print".into(),
                ));
            }
        };
        let director_name = match doc.director_user.as_deref() {
            Some(user) => self.display_name(user)?,
            None => {
                return Err(EdoError::Validation("document has no assigned director".into()));
            }
        };

        let mut executor_names = Vec::new();
        if let Some(executor) = doc.executor.as_deref() {
            executor_names.push(self.display_name(executor)?);
        }
        let mut ranked: Vec<(i64, usize, String)> = Vec::new();
        for (position, user) in doc.co_executors.iter().enumerate() {
            let (priority, display) = match db::get_user(&self.conn, user)? {
                Some(profile) => (profile.fiska_priority, profile.full_name),
                None => (i64::MAX, user.to_string()),
            };
            ranked.push((priority, position, display));
        }
        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        executor_names.extend(ranked.into_iter().map(|(_, _, display)| display));

        Ok(FiskaRequest {
            document_name: doc.name.clone(),
            document_number: doc.incoming_number.clone(),
            document_date: doc.document_date.map(|d| d.format("%d.%m.%Y").to_string()),
            resolution,
            director_name,
            executor_names,
            verification: format!("Документ {}", doc.name),
        })
    }

    fn display_name(&self, user: &str) -> Result<String, EdoError> {
        Ok(db::get_user(&self.conn, user)?
            .map(|p| p.full_name)
            .unwrap_or_else(|| user.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn document_not_found(name: &str) -> EdoError {
    EdoError::NotFound { entity_type: "Document".into(), id: name.into() }
}

/// First 8 hex characters of the SHA-256 of `bytes`.
fn content_hash8(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

/// Move the current main document into the attachment list under a
/// content-hash-suffixed name. Entries already carrying the same hash are
/// dropped first, so demoting identical bytes twice does not grow the list.
fn demote_prior_main(doc: &mut Document, prior_url: &str, prior_bytes: &[u8]) {
    let hash8 = content_hash8(prior_bytes);
    let display = stored_display_name(prior_url);
    let stem = display.strip_suffix(".pdf").unwrap_or(&display);
    let file_name = format!("{stem}_{hash8}.pdf");
    doc.attachments.retain(|a| !a.file_name.contains(&hash8));
    doc.attachments.push(Attachment { file: prior_url.to_string(), file_name });
}

/// Display name of a stored file: the stored name minus the uniqueness
/// prefix the file store prepends.
fn stored_display_name(url: &str) -> String {
    let file = url.rsplit('/').next().unwrap_or(url);
    match file.split_once('_') {
        Some((prefix, rest)) if prefix.len() == 8 && !rest.is_empty() => rest.to_string(),
        _ => file.to_string(),
    }
}

/// Decode a base64 PDF returned by the gateway, checking it actually is
/// one. Failures count as malformed gateway responses.
fn decode_artifact_pdf(pdf_base64: &str) -> Result<Vec<u8>, EdoError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(pdf_base64.trim())
        .map_err(|e| GatewayError::ResponseParsing(format!("artifact is not valid base64: {e}")))?;
    if !stamping::is_pdf(&bytes) {
        return Err(GatewayError::ResponseParsing("artifact is not a PDF".into()).into());
    }
    Ok(bytes)
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    use lopdf::{dictionary, Object, Stream};

    use crate::db::open_memory_database;
    use crate::files::MemoryFileStore;
    use crate::gateway::MockSignatureGateway;
    use crate::models::{DocumentStatus, FieldMapping, ReceptionOffice, Role};
    use crate::stamping::{FixedAdvanceRasterizer, StampPosition};

    const ADMIN: &str = "admin@edo.local";
    const MANAGER: &str = "manager@edo.local";
    const DIRECTOR: &str = "director@edo.local";
    const RECEPTION: &str = "reception@edo.local";
    const EXEC: &str = "exec@edo.local";
    const CO_FIRST: &str = "co.first@edo.local";
    const CO_SECOND: &str = "co.second@edo.local";

    struct TestBed {
        service: EdoService,
        gateway: MockSignatureGateway,
    }

    fn testbed() -> TestBed {
        testbed_with(MockSignatureGateway::new())
    }

    fn testbed_with(gateway: MockSignatureGateway) -> TestBed {
        let conn = open_memory_database().unwrap();

        let people = [
            (ADMIN, "Администратор", Role::Admin, 0),
            (MANAGER, "Менеджер М. М.", Role::Manager, 0),
            (DIRECTOR, "Петров П. П.", Role::Director, 0),
            (RECEPTION, "Смирнова А. А.", Role::Reception, 0),
            (EXEC, "Иванов И. И.", Role::User, 0),
            (CO_FIRST, "Сидоров С. С.", Role::User, 2),
            (CO_SECOND, "Козлов К. К.", Role::User, 1),
        ];
        for (name, full_name, role, priority) in people {
            db::insert_user(
                &conn,
                &UserProfile {
                    name: name.into(),
                    full_name: full_name.into(),
                    user_image: None,
                    enabled: true,
                    roles: vec![role],
                    fiska_priority: priority,
                },
            )
            .unwrap();
        }
        db::insert_office(
            &conn,
            &ReceptionOffice {
                name: "RO-001".into(),
                office_name: "Приёмная №1".into(),
                director: Some(DIRECTOR.into()),
                members: vec![RECEPTION.into()],
            },
        )
        .unwrap();
        db::insert_resolution(
            &conn,
            &ResolutionTemplate {
                name: "RT-001".into(),
                resolution_name: "К исполнению".into(),
                resolution_text: Some("Принять к исполнению".into()),
                is_active: true,
            },
        )
        .unwrap();

        let files = MemoryFileStore::new();
        let stamp_image = files.save("visa.png", &make_stamp_png(), false).unwrap();
        db::insert_stamp(
            &conn,
            &Stamp {
                name: "ST-001".into(),
                stamp_name: "Виза".into(),
                stamp_image: Some(stamp_image.url),
                description: None,
                is_active: true,
                field_mappings: vec![FieldMapping {
                    document_field: "incoming_number".into(),
                    position_x: 10.0,
                    position_y: 10.0,
                    font_size: 12.0,
                    color: "#000000".into(),
                    max_width: 0.0,
                }],
            },
        )
        .unwrap();

        let probe = gateway.clone();
        TestBed {
            service: EdoService::new(
                conn,
                Box::new(files),
                Box::new(gateway),
                StampEngine::new(Box::new(FixedAdvanceRasterizer::new())),
            ),
            gateway: probe,
        }
    }

    fn make_stamp_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(120, 60, image::Rgba([30, 30, 160, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut png, image::ImageOutputFormat::Png)
            .unwrap();
        png.into_inner()
    }

    fn make_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.4");
        let mut page_ids = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, b"q Q".to_vec())));
            page_ids.push(doc.add_object(dictionary! {
                "Type" => Object::Name(b"Page".to_vec()),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
            }));
        }
        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
        });
        for page_id in &page_ids {
            if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(*page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn draft(title: &str) -> DocumentUpdate {
        DocumentUpdate {
            title: title.into(),
            brief_content: None,
            document_date: None,
            incoming_number: Some("ВХ-117".into()),
            incoming_date: None,
            outgoing_number: None,
            outgoing_date: None,
            document_type: None,
            priority: None,
            correspondent: None,
            classification: None,
            delivery_method: None,
        }
    }

    fn submission(executor: Option<&str>, co_executors: &[&str]) -> ReceptionSubmission {
        ReceptionSubmission {
            reception_office: "RO-001".into(),
            resolution: Some("RT-001".into()),
            resolution_text: None,
            executor: executor.map(String::from),
            co_executors: co_executors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Drive a document through creation and routing to На рассмотрении.
    fn routed_document(bed: &mut TestBed) -> String {
        let doc = bed.service.create_document(MANAGER, draft("Входящее письмо")).unwrap();
        bed.service
            .attach_main_document(MANAGER, &doc.name, "скан.pdf", &make_pdf(1))
            .unwrap();
        bed.service
            .reception_submit(RECEPTION, &doc.name, submission(Some(EXEC), &[CO_FIRST, CO_SECOND]))
            .unwrap();
        doc.name
    }

    /// Routed document with the fiska exchange completed.
    fn fiska_processed_document(bed: &mut TestBed) -> String {
        let name = routed_document(bed);
        let sheet = bed.service.generate_fiska(DIRECTOR, &name).unwrap();
        bed.service
            .process_signed_fiska(DIRECTOR, &name, &sheet, "cGtjczc=")
            .unwrap();
        name
    }

    // ── Creation and reads ──

    #[test]
    fn manager_creates_draft_with_sequential_name() {
        let mut bed = testbed();
        let first = bed.service.create_document(MANAGER, draft("Первое письмо")).unwrap();
        let second = bed.service.create_document(ADMIN, draft("Второе письмо")).unwrap();

        assert!(first.name.starts_with("EDO-DOC-"));
        assert!(first.name.ends_with("00001"));
        assert!(second.name.ends_with("00002"));
        assert_eq!(first.status, DocumentStatus::New);
        assert_eq!(first.revision, 0);
    }

    #[test]
    fn reception_cannot_create_documents() {
        let mut bed = testbed();
        let err = bed.service.create_document(RECEPTION, draft("Письмо")).unwrap_err();
        assert!(matches!(err, EdoError::Authorization));
    }

    #[test]
    fn unknown_principal_is_denied() {
        let mut bed = testbed();
        let err = bed.service.create_document("ghost@edo.local", draft("Письмо")).unwrap_err();
        assert!(matches!(err, EdoError::Authorization));
    }

    #[test]
    fn out_of_scope_read_masks_as_not_found() {
        let mut bed = testbed();
        let doc = bed.service.create_document(MANAGER, draft("Скрытое письмо")).unwrap();

        // An executor-class user sees nothing in status Новый.
        let err = bed.service.get_document(EXEC, &doc.name).unwrap_err();
        assert!(matches!(err, EdoError::NotFound { .. }));
    }

    #[test]
    fn listing_is_scoped_to_the_caller() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let all = bed.service.list_documents(MANAGER, &DocumentFilters::default()).unwrap();
        assert_eq!(all.len(), 1);

        // Not yet visible to the executor: status is На рассмотрении.
        let mine = bed.service.list_documents(EXEC, &DocumentFilters::default()).unwrap();
        assert!(mine.is_empty());

        let queue = bed.service.list_documents(DIRECTOR, &DocumentFilters::default()).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].name, name);
    }

    // ── Routing and workflow ──

    #[test]
    fn reception_routes_document_to_the_office_director() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let doc = bed.service.get_document(RECEPTION, &name).unwrap();

        assert_eq!(doc.status, DocumentStatus::UnderReview);
        assert_eq!(doc.director_user.as_deref(), Some(DIRECTOR));
        assert_eq!(doc.reception_user.as_deref(), Some(RECEPTION));
        assert!(doc.reception_decision_date.is_some());
        assert_eq!(doc.executor.as_deref(), Some(EXEC));
        assert_eq!(doc.co_executors.as_slice(), [CO_FIRST.to_string(), CO_SECOND.to_string()]);
        assert!(doc.revision > 0);
    }

    #[test]
    fn metadata_edits_lock_after_submission() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let err = bed
            .service
            .update_document(MANAGER, &name, draft("Переименовано"))
            .unwrap_err();
        assert!(matches!(err, EdoError::Authorization));

        // Admin may still edit.
        let doc = bed.service.update_document(ADMIN, &name, draft("Переименовано")).unwrap();
        assert_eq!(doc.title, "Переименовано");
    }

    #[test]
    fn routing_edits_end_when_review_ends() {
        let mut bed = testbed();
        let name = fiska_processed_document(&mut bed);

        let update = RoutingUpdate {
            resolution: Some("RT-001".into()),
            resolution_text: None,
            executor: Some(CO_FIRST.into()),
            co_executors: vec![EXEC.into()],
        };
        let doc = bed.service.update_routing(DIRECTOR, &name, update.clone()).unwrap();
        assert_eq!(doc.executor.as_deref(), Some(CO_FIRST));

        bed.service.director_approve(DIRECTOR, &name, None).unwrap();
        let err = bed.service.update_routing(DIRECTOR, &name, update).unwrap_err();
        assert!(matches!(err, EdoError::Authorization));
    }

    #[test]
    fn approval_requires_processed_fiska() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let err = bed.service.director_approve(DIRECTOR, &name, None).unwrap_err();
        assert!(matches!(err, EdoError::Workflow(WorkflowError::FiskaNotProcessed)));
    }

    #[test]
    fn full_lifecycle_reaches_completed() {
        let mut bed = testbed();
        let name = fiska_processed_document(&mut bed);

        let doc = bed
            .service
            .director_approve(DIRECTOR, &name, Some("Согласовано".into()))
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::InExecution);
        assert!(doc.director_approved);

        let doc = bed.service.executor_sign(EXEC, &name, None).unwrap();
        assert_eq!(doc.status, DocumentStatus::InExecution);
        let doc = bed.service.executor_sign(CO_FIRST, &name, Some("Исполнено".into())).unwrap();
        assert_eq!(doc.status, DocumentStatus::InExecution);
        let doc = bed.service.executor_sign(CO_SECOND, &name, None).unwrap();
        assert_eq!(doc.status, DocumentStatus::Completed);
        assert_eq!(doc.signatures.len(), 3);

        // Completed documents stay visible to their executors.
        assert!(bed.service.get_document(EXEC, &name).is_ok());
    }

    #[test]
    fn rejection_needs_no_fiska_and_records_the_comment() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let doc = bed
            .service
            .director_reject(DIRECTOR, &name, Some("Не по адресу".into()))
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Rejected);
        assert!(doc.director_rejected);
        assert_eq!(doc.director_comment.as_deref(), Some("Не по адресу"));
    }

    #[test]
    fn approval_without_executor_lands_in_approved() {
        let mut bed = testbed();
        let doc = bed.service.create_document(MANAGER, draft("Письмо без исполнителя")).unwrap();
        bed.service
            .reception_submit(RECEPTION, &doc.name, submission(None, &[]))
            .unwrap();
        let sheet = bed.service.generate_fiska(DIRECTOR, &doc.name).unwrap();
        bed.service
            .process_signed_fiska(DIRECTOR, &doc.name, &sheet, "cGtjczc=")
            .unwrap();

        let doc = bed.service.director_approve(DIRECTOR, &doc.name, None).unwrap();
        assert_eq!(doc.status, DocumentStatus::Approved);
    }

    // ── Fiska exchange ──

    #[test]
    fn fiska_request_orders_executors_by_priority() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        bed.service.generate_fiska(DIRECTOR, &name).unwrap();

        let request = bed.gateway.last_fiska_request().unwrap();
        assert_eq!(request.document_name, name);
        assert_eq!(request.resolution, "Принять к исполнению");
        assert_eq!(request.director_name, "Петров П. П.");
        // Primary executor first, then co-executors by fiska priority.
        assert_eq!(
            request.executor_names,
            ["Иванов И. И.", "Козлов К. К.", "Сидоров С. С."]
        );
        assert_eq!(request.document_number.as_deref(), Some("ВХ-117"));
        assert!(request.verification.contains(&name));
    }

    #[test]
    fn repeated_fiska_exchange_replaces_the_artifact() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let sheet = bed.service.generate_fiska(DIRECTOR, &name).unwrap();

        bed.service.process_signed_fiska(DIRECTOR, &name, &sheet, "cGtjczc=").unwrap();
        let doc = bed.service.process_signed_fiska(DIRECTOR, &name, &sheet, "cGtjczc=").unwrap();

        assert!(doc.fiska_processed);
        let fiska_attachments: Vec<_> = doc
            .attachments
            .iter()
            .filter(|a| a.file_name.starts_with("fiska_"))
            .collect();
        assert_eq!(fiska_attachments.len(), 1);
        assert!(fiska_attachments[0].file_name.ends_with(&format!("{name}.pdf")));
    }

    #[test]
    fn declined_gateway_surfaces_lexdoc_origin() {
        let mut bed = testbed_with(MockSignatureGateway::declining("ключ не найден"));
        let name = routed_document(&mut bed);

        let err = bed
            .service
            .process_signed_fiska(DIRECTOR, &name, "c2lnbmVk", "cGtjczc=")
            .unwrap_err();
        assert_eq!(err.gateway_origin(), Some(ErrorOrigin::Lexdoc));
        assert!(err.to_string().contains("ключ не найден"));
    }

    #[test]
    fn executor_cannot_run_the_fiska_exchange() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let err = bed.service.generate_fiska(EXEC, &name).unwrap_err();
        // The executor cannot even see the document while under review.
        assert!(matches!(err, EdoError::NotFound { .. }));

        let err = bed.service.generate_fiska(MANAGER, &name).unwrap_err();
        assert!(matches!(err, EdoError::Authorization));
    }

    // ── PKCS7 signing ──

    #[test]
    fn pkcs7_signing_replaces_main_and_archives_prior() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let before = bed.service.get_document(DIRECTOR, &name).unwrap();
        let prior_url = before.main_document.clone().unwrap();

        let doc = bed.service.sign_with_pkcs7(DIRECTOR, &name, "cGtjczc=").unwrap();

        let new_url = doc.main_document.clone().unwrap();
        assert_ne!(new_url, prior_url);
        // Prior main archived under a hash-suffixed name, same stored file.
        assert_eq!(doc.attachments.len(), 1);
        assert_eq!(doc.attachments[0].file, prior_url);
        assert!(doc.attachments[0].file_name.starts_with("скан_"));
        assert!(doc.attachments[0].file_name.ends_with(".pdf"));
    }

    #[test]
    fn executor_cannot_sign_pkcs7_while_under_review() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let err = bed.service.sign_with_pkcs7(EXEC, &name, "cGtjczc=").unwrap_err();
        assert!(matches!(err, EdoError::NotFound { .. }));
    }

    // ── Stamps ──

    #[test]
    fn apply_stamps_replaces_main_and_demotes_prior() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);
        let before = bed.service.get_document(RECEPTION, &name).unwrap();
        let prior_url = before.main_document.clone().unwrap();

        let placements = vec![StampPlacement {
            stamp_name: "ST-001".into(),
            page_number: 0,
            position: StampPosition::BottomRight,
            x: None,
            y: None,
            scale: None,
        }];
        let report = bed.service.apply_stamps(RECEPTION, &name, placements).unwrap();

        assert_eq!(report.applied.len(), 1);
        assert!(report.failed.is_empty());
        assert_ne!(report.new_file_url, prior_url);
        assert_eq!(report.document.main_document.as_deref(), Some(report.new_file_url.as_str()));
        assert_eq!(report.document.attachments.len(), 1);
        assert_eq!(report.document.attachments[0].file, prior_url);

        // The stamped artifact is a parseable one-page PDF.
        let info = bed.service.pdf_info(RECEPTION, &name).unwrap();
        assert_eq!(info.page_count, 1);
    }

    #[test]
    fn apply_stamps_reports_unknown_stamps_as_failures() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let placements = vec![
            StampPlacement {
                stamp_name: "ST-001".into(),
                page_number: 0,
                position: StampPosition::TopLeft,
                x: None,
                y: None,
                scale: None,
            },
            StampPlacement {
                stamp_name: "ST-404".into(),
                page_number: 0,
                position: StampPosition::TopRight,
                x: None,
                y: None,
                scale: None,
            },
        ];
        let report = bed.service.apply_stamps(ADMIN, &name, placements).unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].stamp_name, "ST-404");
    }

    #[test]
    fn apply_stamps_needs_a_main_document() {
        let mut bed = testbed();
        let doc = bed.service.create_document(MANAGER, draft("Без файла")).unwrap();

        let placements = vec![StampPlacement {
            stamp_name: "ST-001".into(),
            page_number: 0,
            position: StampPosition::TopLeft,
            x: None,
            y: None,
            scale: None,
        }];
        let err = bed.service.apply_stamps(MANAGER, &doc.name, placements).unwrap_err();
        assert!(matches!(err, EdoError::Validation(_)));
    }

    #[test]
    fn pdf_info_reports_page_dimensions() {
        let mut bed = testbed();
        let doc = bed.service.create_document(MANAGER, draft("Многостраничное")).unwrap();
        bed.service
            .attach_main_document(MANAGER, &doc.name, "скан.pdf", &make_pdf(3))
            .unwrap();

        let info = bed.service.pdf_info(MANAGER, &doc.name).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.pages[0].width, 612.0);
        assert_eq!(info.pages[0].height, 792.0);
    }

    #[test]
    fn stamp_preview_works_with_and_without_a_document() {
        let mut bed = testbed();
        let name = routed_document(&mut bed);

        let placeholder = bed.service.stamp_preview(RECEPTION, "ST-001", None).unwrap();
        assert_eq!(&placeholder[0..4], b"\x89PNG");

        let live = bed.service.stamp_preview(RECEPTION, "ST-001", Some(&name)).unwrap();
        assert_eq!(&live[0..4], b"\x89PNG");
    }

    #[test]
    fn list_stamps_returns_active_stamps_with_mappings() {
        let bed = testbed();
        let stamps = bed.service.list_stamps(MANAGER).unwrap();
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].stamp_name, "Виза");
        assert_eq!(stamps[0].field_mappings.len(), 1);
    }

    // ── Predicates ──

    #[test]
    fn predicates_follow_document_state() {
        let mut bed = testbed();

        assert!(bed.service.can_edit_document(MANAGER, None).unwrap());
        assert!(!bed.service.can_edit_document(RECEPTION, None).unwrap());
        assert!(bed.service.can_reception_submit(RECEPTION).unwrap());
        assert!(!bed.service.can_reception_submit(MANAGER).unwrap());
        assert!(!bed.service.can_reception_submit("ghost@edo.local").unwrap());

        let name = fiska_processed_document(&mut bed);
        assert!(bed.service.can_director_approve(DIRECTOR, &name).unwrap());
        assert!(!bed.service.can_director_approve(RECEPTION, &name).unwrap());
        assert!(!bed.service.can_executor_sign(EXEC, &name).unwrap());

        bed.service.director_approve(DIRECTOR, &name, None).unwrap();
        assert!(!bed.service.can_director_approve(DIRECTOR, &name).unwrap());
        assert!(bed.service.can_executor_sign(EXEC, &name).unwrap());

        bed.service.executor_sign(EXEC, &name, None).unwrap();
        assert!(!bed.service.can_executor_sign(EXEC, &name).unwrap());
        assert!(bed.service.can_executor_sign(CO_FIRST, &name).unwrap());
    }

    // ── Directory ──

    #[test]
    fn list_users_returns_enabled_profiles() {
        let bed = testbed();
        let users = bed.service.list_users(MANAGER).unwrap();
        assert_eq!(users.len(), 7);
        assert!(users.iter().any(|u| u.name == DIRECTOR && u.has_role(Role::Director)));
    }

    #[test]
    fn list_resolutions_returns_active_templates() {
        let bed = testbed();
        let templates = bed.service.list_resolutions(MANAGER).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].display_text(), "Принять к исполнению");
    }
}
