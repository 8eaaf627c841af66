//! Role-scoped access policy for routed documents.
//!
//! Every (principal, action, document state) question is answered here,
//! in one place, instead of being scattered across handlers:
//! 1. Admin → broadest access
//! 2. Manager → sees everything, edits only unsigned drafts
//! 3. Reception member → documents registered through their offices
//! 4. Director → assigned documents, plus directed-office review queue
//! 5. Signing principal → their assignments while in execution
//! 6. Default → DENY
//!
//! Default-deny, checked in order. Listing uses the same rules compiled
//! into a [`VisibilityScope`] that the repository turns into SQL.

use crate::models::enums::{DocumentStatus, Role};
use crate::models::Document;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Everything the policy needs to know about the caller, resolved once
/// per request from the users and reception_offices tables.
#[derive(Debug, Clone)]
pub struct PrincipalContext {
    pub user: String,
    pub roles: Vec<Role>,
    /// Reception offices the user belongs to.
    pub member_offices: Vec<String>,
    /// Reception offices the user directs.
    pub directed_offices: Vec<String>,
}

impl PrincipalContext {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// An operation a principal may attempt on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    EditFull,
    EditRouting,
    SubmitToDirector,
    DirectorApprove,
    DirectorReject,
    ExecutorSign,
    ApplyStamps,
    GenerateFiska,
    ProcessSignedFiska,
    SignPkcs7,
}

/// Why access was granted (or denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Admin role.
    Admin,
    /// Manager role.
    Manager,
    /// Member of the reception office the document was registered through.
    ReceptionMember,
    /// The director the document is assigned to.
    AssignedDirector,
    /// Director of the office whose review queue the document sits in.
    DirectedOfficeReview,
    /// Executor or co-executor of the document.
    SigningPrincipal,
    /// No matching rule.
    Denied,
}

/// Result of a policy check.
#[derive(Debug, Clone, Copy)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

/// Compiled visibility rules for list queries. `all` short-circuits;
/// otherwise the present parts are ORed together, and a scope with no
/// parts matches nothing.
#[derive(Debug, Default, Clone)]
pub struct VisibilityScope {
    pub all: bool,
    pub member_offices: Vec<String>,
    pub director_user: Option<String>,
    pub directed_offices: Vec<String>,
    pub executor_user: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Policy checks
// ═══════════════════════════════════════════════════════════

/// Can the principal register a new document?
pub fn can_create(ctx: &PrincipalContext) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Manager) {
        return AccessDecision::allow(AccessReason::Manager);
    }
    AccessDecision::deny()
}

/// Could the principal ever submit a document to a director? Capability
/// check for UI gating; the document-specific rules still apply at
/// submission time.
pub fn can_submit_any(ctx: &PrincipalContext) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Reception) && !ctx.member_offices.is_empty() {
        return AccessDecision::allow(AccessReason::ReceptionMember);
    }
    AccessDecision::deny()
}

/// Decide `action` on `doc` for the caller. Pure: all state arrives in
/// the arguments.
pub fn evaluate(ctx: &PrincipalContext, action: Action, doc: &Document) -> AccessDecision {
    match action {
        Action::Read => evaluate_read(ctx, doc),
        Action::EditFull => evaluate_edit_full(ctx, doc),
        Action::EditRouting => evaluate_edit_routing(ctx, doc),
        Action::SubmitToDirector => evaluate_submit(ctx, doc),
        Action::DirectorApprove | Action::DirectorReject => evaluate_director_decision(ctx, doc),
        Action::ExecutorSign => evaluate_sign(ctx, doc),
        Action::ApplyStamps => evaluate_apply_stamps(ctx, doc),
        Action::GenerateFiska | Action::ProcessSignedFiska => evaluate_fiska(ctx, doc),
        Action::SignPkcs7 => evaluate_sign_pkcs7(ctx, doc),
    }
}

fn evaluate_read(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Manager) {
        return AccessDecision::allow(AccessReason::Manager);
    }
    if ctx.has_role(Role::Reception) && in_member_office(ctx, doc) {
        return AccessDecision::allow(AccessReason::ReceptionMember);
    }
    if ctx.has_role(Role::Director) {
        if is_assigned_director(ctx, doc) {
            return AccessDecision::allow(AccessReason::AssignedDirector);
        }
        if in_directed_office(ctx, doc) && doc.status == DocumentStatus::UnderReview {
            return AccessDecision::allow(AccessReason::DirectedOfficeReview);
        }
    }
    if doc.is_signing_principal(&ctx.user)
        && matches!(
            doc.status,
            DocumentStatus::InExecution | DocumentStatus::Completed
        )
    {
        return AccessDecision::allow(AccessReason::SigningPrincipal);
    }
    AccessDecision::deny()
}

fn evaluate_edit_full(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    // Managers may only reshape drafts nobody has signed yet.
    if ctx.has_role(Role::Manager)
        && doc.status == DocumentStatus::New
        && doc.signatures.is_empty()
    {
        return AccessDecision::allow(AccessReason::Manager);
    }
    AccessDecision::deny()
}

fn evaluate_edit_routing(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if doc.status != DocumentStatus::UnderReview {
        return AccessDecision::deny();
    }
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Director) && is_assigned_director(ctx, doc) {
        return AccessDecision::allow(AccessReason::AssignedDirector);
    }
    AccessDecision::deny()
}

fn evaluate_submit(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if doc.status != DocumentStatus::New {
        return AccessDecision::deny();
    }
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Reception) && in_member_office(ctx, doc) {
        return AccessDecision::allow(AccessReason::ReceptionMember);
    }
    AccessDecision::deny()
}

fn evaluate_director_decision(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if doc.status != DocumentStatus::UnderReview {
        return AccessDecision::deny();
    }
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Director) && is_assigned_director(ctx, doc) {
        return AccessDecision::allow(AccessReason::AssignedDirector);
    }
    AccessDecision::deny()
}

fn evaluate_sign(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    // Signing is personal: no role, Admin included, signs for someone else.
    if doc.status == DocumentStatus::InExecution && doc.is_signing_principal(&ctx.user) {
        return AccessDecision::allow(AccessReason::SigningPrincipal);
    }
    AccessDecision::deny()
}

fn evaluate_apply_stamps(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Manager) {
        return AccessDecision::allow(AccessReason::Manager);
    }
    if ctx.has_role(Role::Reception) && in_member_office(ctx, doc) {
        return AccessDecision::allow(AccessReason::ReceptionMember);
    }
    AccessDecision::deny()
}

fn evaluate_fiska(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if doc.status != DocumentStatus::UnderReview {
        return AccessDecision::deny();
    }
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Director) && is_assigned_director(ctx, doc) {
        return AccessDecision::allow(AccessReason::AssignedDirector);
    }
    AccessDecision::deny()
}

fn evaluate_sign_pkcs7(ctx: &PrincipalContext, doc: &Document) -> AccessDecision {
    if ctx.has_role(Role::Admin) {
        return AccessDecision::allow(AccessReason::Admin);
    }
    if ctx.has_role(Role::Director)
        && is_assigned_director(ctx, doc)
        && doc.status == DocumentStatus::UnderReview
    {
        return AccessDecision::allow(AccessReason::AssignedDirector);
    }
    if doc.status == DocumentStatus::InExecution && doc.is_signing_principal(&ctx.user) {
        return AccessDecision::allow(AccessReason::SigningPrincipal);
    }
    AccessDecision::deny()
}

// ═══════════════════════════════════════════════════════════
// List visibility
// ═══════════════════════════════════════════════════════════

/// Compile the read rules into a scope for list queries. The scope a
/// principal lists under matches exactly the set of documents
/// [`evaluate`] would let them read.
pub fn visibility_scope(ctx: &PrincipalContext) -> VisibilityScope {
    if ctx.has_role(Role::Admin) || ctx.has_role(Role::Manager) {
        return VisibilityScope {
            all: true,
            ..VisibilityScope::default()
        };
    }

    let mut scope = VisibilityScope::default();
    if ctx.has_role(Role::Reception) {
        scope.member_offices = ctx.member_offices.clone();
    }
    if ctx.has_role(Role::Director) {
        scope.director_user = Some(ctx.user.clone());
        scope.directed_offices = ctx.directed_offices.clone();
    }
    scope.executor_user = Some(ctx.user.clone());
    scope
}

// ═══════════════════════════════════════════════════════════
// Rule helpers
// ═══════════════════════════════════════════════════════════

fn in_member_office(ctx: &PrincipalContext, doc: &Document) -> bool {
    match doc.reception_office.as_deref() {
        Some(office) => ctx.member_offices.iter().any(|o| o == office),
        None => false,
    }
}

fn in_directed_office(ctx: &PrincipalContext, doc: &Document) -> bool {
    match doc.reception_office.as_deref() {
        Some(office) => ctx.directed_offices.iter().any(|o| o == office),
        None => false,
    }
}

fn is_assigned_director(ctx: &PrincipalContext, doc: &Document) -> bool {
    doc.director_user.as_deref() == Some(ctx.user.as_str())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::document::{CoExecutors, Signatures};

    fn ctx(user: &str, roles: Vec<Role>) -> PrincipalContext {
        PrincipalContext {
            user: user.into(),
            roles,
            member_offices: Vec::new(),
            directed_offices: Vec::new(),
        }
    }

    fn doc(status: DocumentStatus) -> Document {
        Document {
            name: "EDO-DOC-2026-00001".into(),
            title: "Входящее письмо".into(),
            status,
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
            reception_office: Some("OFFICE-1".into()),
            reception_user: None,
            reception_decision_date: None,
            director_user: Some("dir@example.com".into()),
            director_approved: false,
            director_rejected: false,
            director_decision_date: None,
            director_comment: None,
            resolution: None,
            resolution_text: None,
            executor: Some("exec@example.com".into()),
            co_executors: CoExecutors::new(),
            signatures: Signatures::new(),
            main_document: None,
            attachments: Vec::new(),
            fiska_processed: false,
            revision: 0,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    // ── Read ─────────────────────────────────────────────

    #[test]
    fn admin_and_manager_read_everything() {
        let d = doc(DocumentStatus::New);
        assert!(evaluate(&ctx("a@example.com", vec![Role::Admin]), Action::Read, &d).allowed);
        assert!(evaluate(&ctx("m@example.com", vec![Role::Manager]), Action::Read, &d).allowed);
    }

    #[test]
    fn reception_reads_only_member_office_documents() {
        let d = doc(DocumentStatus::New);
        let mut member = ctx("r@example.com", vec![Role::Reception]);
        member.member_offices = vec!["OFFICE-1".into()];
        let outsider = ctx("r2@example.com", vec![Role::Reception]);

        let allowed = evaluate(&member, Action::Read, &d);
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, AccessReason::ReceptionMember);
        assert!(!evaluate(&outsider, Action::Read, &d).allowed);
    }

    #[test]
    fn director_reads_assigned_documents_in_any_state() {
        let director = ctx("dir@example.com", vec![Role::Director]);
        for status in [
            DocumentStatus::New,
            DocumentStatus::UnderReview,
            DocumentStatus::InExecution,
            DocumentStatus::Completed,
        ] {
            let decision = evaluate(&director, Action::Read, &doc(status));
            assert!(decision.allowed, "status {status:?}");
            assert_eq!(decision.reason, AccessReason::AssignedDirector);
        }
    }

    #[test]
    fn director_sees_directed_office_queue_only_under_review() {
        let mut director = ctx("other-dir@example.com", vec![Role::Director]);
        director.directed_offices = vec!["OFFICE-1".into()];

        let review = evaluate(&director, Action::Read, &doc(DocumentStatus::UnderReview));
        assert!(review.allowed);
        assert_eq!(review.reason, AccessReason::DirectedOfficeReview);

        assert!(!evaluate(&director, Action::Read, &doc(DocumentStatus::New)).allowed);
        assert!(!evaluate(&director, Action::Read, &doc(DocumentStatus::InExecution)).allowed);
    }

    #[test]
    fn executor_reads_own_assignments_in_execution_and_completed() {
        let executor = ctx("exec@example.com", vec![Role::User]);

        assert!(evaluate(&executor, Action::Read, &doc(DocumentStatus::InExecution)).allowed);
        assert!(evaluate(&executor, Action::Read, &doc(DocumentStatus::Completed)).allowed);
        assert!(!evaluate(&executor, Action::Read, &doc(DocumentStatus::New)).allowed);
        assert!(!evaluate(&executor, Action::Read, &doc(DocumentStatus::UnderReview)).allowed);
    }

    #[test]
    fn co_executor_reads_like_executor() {
        let mut d = doc(DocumentStatus::InExecution);
        d.co_executors =
            CoExecutors::from_users(vec!["co@example.com".into()], d.executor.as_deref());
        assert!(evaluate(&ctx("co@example.com", vec![Role::User]), Action::Read, &d).allowed);
    }

    #[test]
    fn stranger_is_denied() {
        let decision = evaluate(
            &ctx("stranger@example.com", vec![Role::User]),
            Action::Read,
            &doc(DocumentStatus::InExecution),
        );
        assert!(!decision.allowed);
        assert_eq!(decision.reason, AccessReason::Denied);
    }

    // ── Create ───────────────────────────────────────────

    #[test]
    fn create_needs_admin_or_manager() {
        assert!(can_create(&ctx("a@example.com", vec![Role::Admin])).allowed);
        assert!(can_create(&ctx("m@example.com", vec![Role::Manager])).allowed);
        assert!(!can_create(&ctx("r@example.com", vec![Role::Reception])).allowed);
        assert!(!can_create(&ctx("u@example.com", vec![Role::User])).allowed);
        assert!(!can_create(&ctx("d@example.com", vec![Role::Director])).allowed);
    }

    #[test]
    fn submit_capability_needs_admin_or_office_membership() {
        assert!(can_submit_any(&ctx("a@example.com", vec![Role::Admin])).allowed);

        let mut reception = ctx("r@example.com", vec![Role::Reception]);
        assert!(!can_submit_any(&reception).allowed);
        reception.member_offices.push("OFFICE-1".into());
        assert!(can_submit_any(&reception).allowed);

        assert!(!can_submit_any(&ctx("m@example.com", vec![Role::Manager])).allowed);
    }

    // ── Full edit ────────────────────────────────────────

    #[test]
    fn admin_edits_in_any_state() {
        for status in [
            DocumentStatus::New,
            DocumentStatus::UnderReview,
            DocumentStatus::Completed,
        ] {
            assert!(
                evaluate(&ctx("a@example.com", vec![Role::Admin]), Action::EditFull, &doc(status))
                    .allowed
            );
        }
    }

    #[test]
    fn manager_edits_only_unsigned_new_documents() {
        let manager = ctx("m@example.com", vec![Role::Manager]);
        assert!(evaluate(&manager, Action::EditFull, &doc(DocumentStatus::New)).allowed);
        assert!(!evaluate(&manager, Action::EditFull, &doc(DocumentStatus::UnderReview)).allowed);

        let mut signed = doc(DocumentStatus::New);
        signed.signatures.try_add(crate::models::SignatureEntry {
            user: "exec@example.com".into(),
            signed_at: Utc::now(),
            comment: None,
        });
        assert!(!evaluate(&manager, Action::EditFull, &signed).allowed);
    }

    // ── Routing edit ─────────────────────────────────────

    #[test]
    fn assigned_director_edits_routing_during_review() {
        let director = ctx("dir@example.com", vec![Role::Director]);
        assert!(evaluate(&director, Action::EditRouting, &doc(DocumentStatus::UnderReview)).allowed);
        assert!(!evaluate(&director, Action::EditRouting, &doc(DocumentStatus::New)).allowed);
        assert!(
            !evaluate(&director, Action::EditRouting, &doc(DocumentStatus::InExecution)).allowed
        );
    }

    #[test]
    fn unassigned_director_cannot_edit_routing() {
        let other = ctx("other@example.com", vec![Role::Director]);
        assert!(!evaluate(&other, Action::EditRouting, &doc(DocumentStatus::UnderReview)).allowed);
    }

    #[test]
    fn routing_edit_outside_review_denied_even_for_admin() {
        let admin = ctx("a@example.com", vec![Role::Admin]);
        assert!(!evaluate(&admin, Action::EditRouting, &doc(DocumentStatus::New)).allowed);
        assert!(evaluate(&admin, Action::EditRouting, &doc(DocumentStatus::UnderReview)).allowed);
    }

    // ── Workflow transitions ─────────────────────────────

    #[test]
    fn submit_requires_reception_membership_and_new_state() {
        let mut reception = ctx("r@example.com", vec![Role::Reception]);
        reception.member_offices = vec!["OFFICE-1".into()];

        assert!(evaluate(&reception, Action::SubmitToDirector, &doc(DocumentStatus::New)).allowed);
        assert!(
            !evaluate(&reception, Action::SubmitToDirector, &doc(DocumentStatus::UnderReview))
                .allowed
        );

        let outsider = ctx("r2@example.com", vec![Role::Reception]);
        assert!(!evaluate(&outsider, Action::SubmitToDirector, &doc(DocumentStatus::New)).allowed);
    }

    #[test]
    fn director_decisions_gated_on_assignment_and_review_state() {
        let director = ctx("dir@example.com", vec![Role::Director]);
        for action in [Action::DirectorApprove, Action::DirectorReject] {
            assert!(evaluate(&director, action, &doc(DocumentStatus::UnderReview)).allowed);
            assert!(!evaluate(&director, action, &doc(DocumentStatus::New)).allowed);
        }
        let other = ctx("other@example.com", vec![Role::Director]);
        assert!(!evaluate(&other, Action::DirectorApprove, &doc(DocumentStatus::UnderReview)).allowed);
    }

    #[test]
    fn signing_is_personal_not_role_based() {
        let d = doc(DocumentStatus::InExecution);
        assert!(evaluate(&ctx("exec@example.com", vec![Role::User]), Action::ExecutorSign, &d).allowed);
        // Even an admin cannot sign a document they are not assigned to.
        assert!(!evaluate(&ctx("a@example.com", vec![Role::Admin]), Action::ExecutorSign, &d).allowed);
        assert!(!evaluate(
            &ctx("exec@example.com", vec![Role::User]),
            Action::ExecutorSign,
            &doc(DocumentStatus::New)
        )
        .allowed);
    }

    // ── Stamps ───────────────────────────────────────────

    #[test]
    fn stamps_for_admin_manager_and_member_reception_only() {
        let d = doc(DocumentStatus::New);
        assert!(evaluate(&ctx("a@example.com", vec![Role::Admin]), Action::ApplyStamps, &d).allowed);
        assert!(evaluate(&ctx("m@example.com", vec![Role::Manager]), Action::ApplyStamps, &d).allowed);

        let mut member = ctx("r@example.com", vec![Role::Reception]);
        member.member_offices = vec!["OFFICE-1".into()];
        assert!(evaluate(&member, Action::ApplyStamps, &d).allowed);

        let outsider = ctx("r2@example.com", vec![Role::Reception]);
        assert!(!evaluate(&outsider, Action::ApplyStamps, &d).allowed);
        assert!(!evaluate(&ctx("exec@example.com", vec![Role::User]), Action::ApplyStamps, &d).allowed);
    }

    // ── Fiska ────────────────────────────────────────────

    #[test]
    fn fiska_phases_restricted_to_assigned_director_under_review() {
        let director = ctx("dir@example.com", vec![Role::Director]);
        for action in [Action::GenerateFiska, Action::ProcessSignedFiska] {
            assert!(evaluate(&director, action, &doc(DocumentStatus::UnderReview)).allowed);
            assert!(!evaluate(&director, action, &doc(DocumentStatus::InExecution)).allowed);
        }
        let executor = ctx("exec@example.com", vec![Role::User]);
        assert!(!evaluate(&executor, Action::GenerateFiska, &doc(DocumentStatus::UnderReview)).allowed);
    }

    #[test]
    fn pkcs7_allows_director_in_review_then_signers_in_execution() {
        let director = ctx("dir@example.com", vec![Role::Director]);
        assert!(evaluate(&director, Action::SignPkcs7, &doc(DocumentStatus::UnderReview)).allowed);
        assert!(!evaluate(&director, Action::SignPkcs7, &doc(DocumentStatus::InExecution)).allowed);

        let executor = ctx("exec@example.com", vec![Role::User]);
        assert!(!evaluate(&executor, Action::SignPkcs7, &doc(DocumentStatus::UnderReview)).allowed);
        assert!(evaluate(&executor, Action::SignPkcs7, &doc(DocumentStatus::InExecution)).allowed);
    }

    // ── Visibility scope ─────────────────────────────────

    #[test]
    fn scope_is_unrestricted_for_admin_and_manager() {
        assert!(visibility_scope(&ctx("a@example.com", vec![Role::Admin])).all);
        assert!(visibility_scope(&ctx("m@example.com", vec![Role::Manager])).all);
    }

    #[test]
    fn scope_composes_parts_for_multi_role_principals() {
        let mut principal = ctx("p@example.com", vec![Role::Reception, Role::Director]);
        principal.member_offices = vec!["OFFICE-1".into()];
        principal.directed_offices = vec!["OFFICE-2".into()];

        let scope = visibility_scope(&principal);
        assert!(!scope.all);
        assert_eq!(scope.member_offices, vec!["OFFICE-1"]);
        assert_eq!(scope.director_user.as_deref(), Some("p@example.com"));
        assert_eq!(scope.directed_offices, vec!["OFFICE-2"]);
        assert_eq!(scope.executor_user.as_deref(), Some("p@example.com"));
    }

    #[test]
    fn scope_for_plain_user_is_executor_only() {
        let scope = visibility_scope(&ctx("u@example.com", vec![Role::User]));
        assert!(!scope.all);
        assert!(scope.member_offices.is_empty());
        assert!(scope.director_user.is_none());
        assert_eq!(scope.executor_user.as_deref(), Some("u@example.com"));
    }
}
