use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::access::VisibilityScope;
use crate::db::DatabaseError;
use crate::models::document::{Attachment, CoExecutors, SignatureEntry, Signatures};
use crate::models::enums::DocumentStatus;
use crate::models::Document;

/// Portal list filters. All optional; present filters are ANDed together.
#[derive(Debug, Default, Clone)]
pub struct DocumentFilters {
    /// Substring match over name, title, numbers and correspondent.
    pub search: Option<String>,
    pub status: Option<DocumentStatus>,
    pub document_type: Option<String>,
    pub priority: Option<String>,
    pub correspondent: Option<String>,
}

/// A list row for the portal feed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    pub title: String,
    pub status: DocumentStatus,
    pub document_type: Option<String>,
    pub priority: Option<String>,
    pub correspondent: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub incoming_number: Option<String>,
    pub executor: Option<String>,
    pub director_user: Option<String>,
    pub modified_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════
// Naming series
// ═══════════════════════════════════════════

/// Allocate the next sequential code for the given year,
/// e.g. `EDO-DOC-2026-00042`.
pub fn next_document_name(conn: &Connection, year: i32) -> Result<String, DatabaseError> {
    let series = format!("EDO-DOC-{year}");
    conn.execute(
        "INSERT INTO naming_series (series, current) VALUES (?1, 0)
         ON CONFLICT(series) DO NOTHING",
        params![series],
    )?;
    conn.execute(
        "UPDATE naming_series SET current = current + 1 WHERE series = ?1",
        params![series],
    )?;
    let current: i64 = conn.query_row(
        "SELECT current FROM naming_series WHERE series = ?1",
        params![series],
        |row| row.get(0),
    )?;
    Ok(format!("{series}-{current:05}"))
}

// ═══════════════════════════════════════════
// CRUD
// ═══════════════════════════════════════════

/// Insert a new document aggregate. Assigns the sequential name in the
/// same transaction as the row and child inserts.
pub fn insert_document(conn: &mut Connection, doc: &mut Document) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;

    doc.name = next_document_name(&tx, doc.created_at.year())?;
    tx.execute(
        "INSERT INTO documents (name, title, status, brief_content, document_date,
         incoming_number, incoming_date, outgoing_number, outgoing_date,
         document_type, priority, correspondent, classification, delivery_method,
         reception_office, reception_user, reception_decision_date,
         director_user, director_approved, director_rejected, director_decision_date,
         director_comment, resolution, resolution_text, executor, main_document,
         fiska_processed, revision, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30)",
        params![
            doc.name,
            doc.title,
            doc.status.as_str(),
            doc.brief_content,
            doc.document_date,
            doc.incoming_number,
            doc.incoming_date,
            doc.outgoing_number,
            doc.outgoing_date,
            doc.document_type,
            doc.priority,
            doc.correspondent,
            doc.classification,
            doc.delivery_method,
            doc.reception_office,
            doc.reception_user,
            doc.reception_decision_date,
            doc.director_user,
            doc.director_approved as i32,
            doc.director_rejected as i32,
            doc.director_decision_date,
            doc.director_comment,
            doc.resolution,
            doc.resolution_text,
            doc.executor,
            doc.main_document,
            doc.fiska_processed as i32,
            doc.revision,
            doc.created_at,
            doc.modified_at,
        ],
    )?;
    write_children(&tx, doc)?;
    tx.commit()?;
    Ok(())
}

pub fn get_document(conn: &Connection, name: &str) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, title, status, brief_content, document_date,
         incoming_number, incoming_date, outgoing_number, outgoing_date,
         document_type, priority, correspondent, classification, delivery_method,
         reception_office, reception_user, reception_decision_date,
         director_user, director_approved, director_rejected, director_decision_date,
         director_comment, resolution, resolution_text, executor, main_document,
         fiska_processed, revision, created_at, modified_at
         FROM documents WHERE name = ?1",
    )?;

    let result = stmt.query_row(params![name], |row| {
        Ok(DocumentRow {
            name: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
            brief_content: row.get(3)?,
            document_date: row.get(4)?,
            incoming_number: row.get(5)?,
            incoming_date: row.get(6)?,
            outgoing_number: row.get(7)?,
            outgoing_date: row.get(8)?,
            document_type: row.get(9)?,
            priority: row.get(10)?,
            correspondent: row.get(11)?,
            classification: row.get(12)?,
            delivery_method: row.get(13)?,
            reception_office: row.get(14)?,
            reception_user: row.get(15)?,
            reception_decision_date: row.get(16)?,
            director_user: row.get(17)?,
            director_approved: row.get(18)?,
            director_rejected: row.get(19)?,
            director_decision_date: row.get(20)?,
            director_comment: row.get(21)?,
            resolution: row.get(22)?,
            resolution_text: row.get(23)?,
            executor: row.get(24)?,
            main_document: row.get(25)?,
            fiska_processed: row.get(26)?,
            revision: row.get(27)?,
            created_at: row.get(28)?,
            modified_at: row.get(29)?,
        })
    });

    let row = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut doc = document_from_row(row)?;
    load_children(conn, &mut doc)?;
    Ok(Some(doc))
}

pub fn document_exists(conn: &Connection, name: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Persist a mutated aggregate with an optimistic revision check.
///
/// The UPDATE only matches when the stored revision equals the revision
/// the aggregate was loaded with; zero matched rows means either the
/// document vanished (NotFound) or someone else saved first (Conflict).
/// Child tables are rewritten inside the same transaction.
/// Returns the new revision on success.
pub fn save_document(conn: &mut Connection, doc: &Document) -> Result<i64, DatabaseError> {
    let tx = conn.transaction()?;
    let new_revision = doc.revision + 1;
    let now = Utc::now();

    let rows = tx.execute(
        "UPDATE documents SET title = ?2, status = ?3, brief_content = ?4,
         document_date = ?5, incoming_number = ?6, incoming_date = ?7,
         outgoing_number = ?8, outgoing_date = ?9, document_type = ?10,
         priority = ?11, correspondent = ?12, classification = ?13,
         delivery_method = ?14, reception_office = ?15, reception_user = ?16,
         reception_decision_date = ?17, director_user = ?18,
         director_approved = ?19, director_rejected = ?20,
         director_decision_date = ?21, director_comment = ?22, resolution = ?23,
         resolution_text = ?24, executor = ?25, main_document = ?26,
         fiska_processed = ?27, revision = ?28, modified_at = ?29
         WHERE name = ?1 AND revision = ?30",
        params![
            doc.name,
            doc.title,
            doc.status.as_str(),
            doc.brief_content,
            doc.document_date,
            doc.incoming_number,
            doc.incoming_date,
            doc.outgoing_number,
            doc.outgoing_date,
            doc.document_type,
            doc.priority,
            doc.correspondent,
            doc.classification,
            doc.delivery_method,
            doc.reception_office,
            doc.reception_user,
            doc.reception_decision_date,
            doc.director_user,
            doc.director_approved as i32,
            doc.director_rejected as i32,
            doc.director_decision_date,
            doc.director_comment,
            doc.resolution,
            doc.resolution_text,
            doc.executor,
            doc.main_document,
            doc.fiska_processed as i32,
            new_revision,
            now,
            doc.revision,
        ],
    )?;

    if rows == 0 {
        if document_exists(&tx, &doc.name)? {
            return Err(DatabaseError::Conflict {
                entity_type: "Document".into(),
                id: doc.name.clone(),
            });
        }
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: doc.name.clone(),
        });
    }

    tx.execute(
        "DELETE FROM document_co_executors WHERE document_name = ?1",
        params![doc.name],
    )?;
    tx.execute(
        "DELETE FROM document_signatures WHERE document_name = ?1",
        params![doc.name],
    )?;
    tx.execute(
        "DELETE FROM document_attachments WHERE document_name = ?1",
        params![doc.name],
    )?;
    write_children(&tx, doc)?;

    tx.commit()?;
    Ok(new_revision)
}

// ═══════════════════════════════════════════
// Listing
// ═══════════════════════════════════════════

/// List documents visible under `scope`, narrowed by `filters`,
/// newest first.
pub fn list_documents(
    conn: &Connection,
    scope: &VisibilityScope,
    filters: &DocumentFilters,
) -> Result<Vec<DocumentSummary>, DatabaseError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut bound: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(clause) = scope_clause(scope, &mut bound) {
        clauses.push(clause);
    }

    if let Some(ref search) = filters.search {
        let pattern = format!("%{}%", search.trim());
        for _ in 0..5 {
            bound.push(Box::new(pattern.clone()));
        }
        let n = bound.len();
        clauses.push(format!(
            "(d.name LIKE ?{} OR d.title LIKE ?{} OR d.incoming_number LIKE ?{} \
             OR d.outgoing_number LIKE ?{} OR d.correspondent LIKE ?{})",
            n - 4,
            n - 3,
            n - 2,
            n - 1,
            n
        ));
    }
    if let Some(status) = filters.status {
        bound.push(Box::new(status.as_str().to_string()));
        clauses.push(format!("d.status = ?{}", bound.len()));
    }
    if let Some(ref document_type) = filters.document_type {
        bound.push(Box::new(document_type.clone()));
        clauses.push(format!("d.document_type = ?{}", bound.len()));
    }
    if let Some(ref priority) = filters.priority {
        bound.push(Box::new(priority.clone()));
        clauses.push(format!("d.priority = ?{}", bound.len()));
    }
    if let Some(ref correspondent) = filters.correspondent {
        bound.push(Box::new(correspondent.clone()));
        clauses.push(format!("d.correspondent = ?{}", bound.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT d.name, d.title, d.status, d.document_type, d.priority,
                d.correspondent, d.document_date, d.incoming_number, d.executor,
                d.director_user, d.modified_at
         FROM documents d{where_sql}
         ORDER BY d.modified_at DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<NaiveDate>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, DateTime<Utc>>(10)?,
        ))
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        let (
            name,
            title,
            status,
            document_type,
            priority,
            correspondent,
            document_date,
            incoming_number,
            executor,
            director_user,
            modified_at,
        ) = row?;
        summaries.push(DocumentSummary {
            name,
            title,
            status: DocumentStatus::from_str(&status)?,
            document_type,
            priority,
            correspondent,
            document_date,
            incoming_number,
            executor,
            director_user,
            modified_at,
        });
    }
    Ok(summaries)
}

/// Translate a visibility scope into a WHERE fragment over alias `d`.
/// Returns None when the scope imposes no restriction.
fn scope_clause(
    scope: &VisibilityScope,
    bound: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
) -> Option<String> {
    if scope.all {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();

    if !scope.member_offices.is_empty() {
        let mut placeholders = Vec::new();
        for office in &scope.member_offices {
            bound.push(Box::new(office.clone()));
            placeholders.push(format!("?{}", bound.len()));
        }
        parts.push(format!(
            "d.reception_office IN ({})",
            placeholders.join(", ")
        ));
    }

    if let Some(ref director) = scope.director_user {
        bound.push(Box::new(director.clone()));
        parts.push(format!("d.director_user = ?{}", bound.len()));

        if !scope.directed_offices.is_empty() {
            let mut placeholders = Vec::new();
            for office in &scope.directed_offices {
                bound.push(Box::new(office.clone()));
                placeholders.push(format!("?{}", bound.len()));
            }
            parts.push(format!(
                "(d.reception_office IN ({}) AND d.status = '{}')",
                placeholders.join(", "),
                DocumentStatus::UnderReview.as_str()
            ));
        }
    }

    if let Some(ref user) = scope.executor_user {
        bound.push(Box::new(user.clone()));
        let executor_n = bound.len();
        bound.push(Box::new(user.clone()));
        let co_executor_n = bound.len();
        parts.push(format!(
            "((d.executor = ?{executor_n} OR EXISTS (SELECT 1 FROM document_co_executors c \
             WHERE c.document_name = d.name AND c.user = ?{co_executor_n})) \
             AND d.status IN ('{}', '{}'))",
            DocumentStatus::InExecution.as_str(),
            DocumentStatus::Completed.as_str()
        ));
    }

    if parts.is_empty() {
        // Scoped principal with nothing visible.
        return Some("0".into());
    }
    Some(format!("({})", parts.join(" OR ")))
}

// ═══════════════════════════════════════════
// Child collections
// ═══════════════════════════════════════════

fn write_children(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    for (position, user) in doc.co_executors.iter().enumerate() {
        conn.execute(
            "INSERT INTO document_co_executors (document_name, position, user)
             VALUES (?1, ?2, ?3)",
            params![doc.name, position as i64, user],
        )?;
    }
    for entry in doc.signatures.iter() {
        conn.execute(
            "INSERT INTO document_signatures (document_name, user, signed_at, comment)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc.name, entry.user, entry.signed_at, entry.comment],
        )?;
    }
    for (position, attachment) in doc.attachments.iter().enumerate() {
        conn.execute(
            "INSERT INTO document_attachments (document_name, position, file, file_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc.name, position as i64, attachment.file, attachment.file_name],
        )?;
    }
    Ok(())
}

fn load_children(conn: &Connection, doc: &mut Document) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT user FROM document_co_executors
         WHERE document_name = ?1 ORDER BY position",
    )?;
    let users: Vec<String> = stmt
        .query_map(params![doc.name], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    doc.co_executors = CoExecutors::from_users(users, doc.executor.as_deref());

    let mut stmt = conn.prepare(
        "SELECT user, signed_at, comment FROM document_signatures
         WHERE document_name = ?1 ORDER BY signed_at",
    )?;
    let entries: Vec<SignatureEntry> = stmt
        .query_map(params![doc.name], |row| {
            Ok(SignatureEntry {
                user: row.get(0)?,
                signed_at: row.get(1)?,
                comment: row.get(2)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    doc.signatures = Signatures::from_entries(entries);

    let mut stmt = conn.prepare(
        "SELECT file, file_name FROM document_attachments
         WHERE document_name = ?1 ORDER BY position",
    )?;
    doc.attachments = stmt
        .query_map(params![doc.name], |row| {
            Ok(Attachment {
                file: row.get(0)?,
                file_name: row.get(1)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(())
}

// Internal row type for Document mapping
struct DocumentRow {
    name: String,
    title: String,
    status: String,
    brief_content: Option<String>,
    document_date: Option<NaiveDate>,
    incoming_number: Option<String>,
    incoming_date: Option<NaiveDate>,
    outgoing_number: Option<String>,
    outgoing_date: Option<NaiveDate>,
    document_type: Option<String>,
    priority: Option<String>,
    correspondent: Option<String>,
    classification: Option<String>,
    delivery_method: Option<String>,
    reception_office: Option<String>,
    reception_user: Option<String>,
    reception_decision_date: Option<DateTime<Utc>>,
    director_user: Option<String>,
    director_approved: i32,
    director_rejected: i32,
    director_decision_date: Option<DateTime<Utc>>,
    director_comment: Option<String>,
    resolution: Option<String>,
    resolution_text: Option<String>,
    executor: Option<String>,
    main_document: Option<String>,
    fiska_processed: i32,
    revision: i64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        name: row.name,
        title: row.title,
        status: DocumentStatus::from_str(&row.status)?,
        brief_content: row.brief_content,
        document_date: row.document_date,
        incoming_number: row.incoming_number,
        incoming_date: row.incoming_date,
        outgoing_number: row.outgoing_number,
        outgoing_date: row.outgoing_date,
        document_type: row.document_type,
        priority: row.priority,
        correspondent: row.correspondent,
        classification: row.classification,
        delivery_method: row.delivery_method,
        reception_office: row.reception_office,
        reception_user: row.reception_user,
        reception_decision_date: row.reception_decision_date,
        director_user: row.director_user,
        director_approved: row.director_approved != 0,
        director_rejected: row.director_rejected != 0,
        director_decision_date: row.director_decision_date,
        director_comment: row.director_comment,
        resolution: row.resolution,
        resolution_text: row.resolution_text,
        executor: row.executor,
        co_executors: CoExecutors::new(),
        signatures: Signatures::new(),
        main_document: row.main_document,
        attachments: Vec::new(),
        fiska_processed: row.fiska_processed != 0,
        revision: row.revision,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}
