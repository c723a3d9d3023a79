use crate::model::{Lesson, LessonStatus, PersonRef, Profile, Relation, Role};
use chrono::{NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

/// Typed failures surfaced unchanged by every access-layer function.
/// Handlers map these to wire error codes; nothing below this layer
/// retries or swallows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not configured")]
    NotConfigured,
    #[error("{0}")]
    Auth(String),
    #[error("profile creation failed: {0}")]
    ProfileCreation(String),
    #[error("{0}")]
    Validation(String),
    #[error("student is already in your list")]
    DuplicateRelation,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(inner, _) => {
            // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
            inner.extended_code == 2067 || inner.extended_code == 1555
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Profiles

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO profiles(id, email, full_name, role, created_at) VALUES(?, ?, ?, ?, ?)",
        (
            &profile.id,
            &profile.email,
            &profile.full_name,
            profile.role.as_str(),
            &profile.created_at,
        ),
    )?;
    Ok(())
}

fn map_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let role_raw: String = row.get(3)?;
    let role = Role::parse(&role_raw).ok_or_else(|| bad_column(3, &role_raw))?;
    Ok(Profile {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role,
        created_at: row.get(4)?,
    })
}

pub fn profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, email, full_name, role, created_at FROM profiles WHERE id = ?",
            [id],
            map_profile,
        )
        .optional()?;
    Ok(row)
}

pub fn profile_by_email(conn: &Connection, email: &str) -> Result<Option<Profile>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, email, full_name, role, created_at FROM profiles WHERE email = ?",
            [email],
            map_profile,
        )
        .optional()?;
    Ok(row)
}

/// Normalize an email the way every lookup and insert does: trimmed,
/// lowercased. Exact match after that, never fuzzy.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Lessons

#[derive(Debug, Clone)]
pub struct LessonInput {
    pub student_id: String,
    pub subject: String,
    pub lesson_date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub status: LessonStatus,
}

/// Partial update. `None` leaves a field alone; for the optional text
/// fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct LessonPatch {
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub lesson_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<Option<String>>,
    pub meeting_link: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<LessonStatus>,
}

const LESSON_SELECT: &str = "SELECT
    l.id, l.teacher_id, l.student_id, l.subject, l.lesson_date,
    l.start_time, l.end_time, l.description, l.meeting_link, l.notes,
    l.status, l.created_at,
    t.full_name, t.email, s.full_name, s.email
 FROM lessons l
 JOIN profiles t ON t.id = l.teacher_id
 JOIN profiles s ON s.id = l.student_id";

fn bad_column(idx: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unexpected value: {raw}").into(),
    )
}

fn map_lesson(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    let status_raw: String = row.get(10)?;
    let status = LessonStatus::parse(&status_raw).ok_or_else(|| bad_column(10, &status_raw))?;
    let teacher_id: String = row.get(1)?;
    let student_id: String = row.get(2)?;
    Ok(Lesson {
        id: row.get(0)?,
        teacher_id: teacher_id.clone(),
        student_id: student_id.clone(),
        subject: row.get(3)?,
        lesson_date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        description: row.get(7)?,
        meeting_link: row.get(8)?,
        notes: row.get(9)?,
        status,
        created_at: row.get(11)?,
        teacher: PersonRef {
            id: teacher_id,
            full_name: row.get(12)?,
            email: row.get(13)?,
        },
        student: PersonRef {
            id: student_id,
            full_name: row.get(14)?,
            email: row.get(15)?,
        },
    })
}

pub fn normalize_date(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| StoreError::Validation(format!("invalid date: {trimmed}")))
}

/// Accepts `HH:MM` or `HH:MM:SS`, stores `HH:MM` so that lexicographic
/// comparison matches time order.
pub fn normalize_time(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| StoreError::Validation(format!("invalid time: {trimmed}")))
}

fn validate_lesson(conn: &Connection, input: &mut LessonInput) -> Result<(), StoreError> {
    input.subject = input.subject.trim().to_string();
    if input.subject.is_empty() {
        return Err(StoreError::Validation("subject must not be empty".into()));
    }
    input.lesson_date = normalize_date(&input.lesson_date)?;
    input.start_time = normalize_time(&input.start_time)?;
    input.end_time = normalize_time(&input.end_time)?;
    if input.end_time <= input.start_time {
        return Err(StoreError::Validation(
            "end time must be after start time".into(),
        ));
    }
    match profile_by_id(conn, &input.student_id)? {
        Some(p) if p.role == Role::Student => Ok(()),
        Some(_) => Err(StoreError::Validation(
            "student reference must be a student profile".into(),
        )),
        None => Err(StoreError::Validation("unknown student".into())),
    }
}

pub fn get_lesson(conn: &Connection, id: &str) -> Result<Option<Lesson>, StoreError> {
    let sql = format!("{LESSON_SELECT} WHERE l.id = ?");
    Ok(conn.query_row(&sql, [id], map_lesson).optional()?)
}

pub fn list_lessons(
    conn: &Connection,
    person_id: &str,
    role: Role,
    status: Option<LessonStatus>,
) -> Result<Vec<Lesson>, StoreError> {
    let mut sql = String::from(LESSON_SELECT);
    sql.push_str(match role {
        Role::Teacher => " WHERE l.teacher_id = ?",
        Role::Student => " WHERE l.student_id = ?",
    });
    let mut args = vec![person_id.to_string()];
    if let Some(status) = status {
        sql.push_str(" AND l.status = ?");
        args.push(status.as_str().to_string());
    }
    sql.push_str(" ORDER BY l.lesson_date, l.start_time, l.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), map_lesson)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Scheduled lessons dated today or later, soonest first, capped at 10.
pub fn upcoming_lessons(
    conn: &Connection,
    person_id: &str,
    role: Role,
    today: &str,
) -> Result<Vec<Lesson>, StoreError> {
    let mut sql = String::from(LESSON_SELECT);
    sql.push_str(match role {
        Role::Teacher => " WHERE l.teacher_id = ?",
        Role::Student => " WHERE l.student_id = ?",
    });
    sql.push_str(" AND l.status = 'scheduled' AND l.lesson_date >= ?");
    sql.push_str(" ORDER BY l.lesson_date, l.start_time, l.id LIMIT 10");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter([person_id, today]), map_lesson)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_lesson(
    conn: &Connection,
    teacher_id: &str,
    mut input: LessonInput,
) -> Result<Lesson, StoreError> {
    validate_lesson(conn, &mut input)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO lessons(id, teacher_id, student_id, subject, lesson_date,
                             start_time, end_time, description, meeting_link,
                             notes, status, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            teacher_id,
            &input.student_id,
            &input.subject,
            &input.lesson_date,
            &input.start_time,
            &input.end_time,
            &input.description,
            &input.meeting_link,
            &input.notes,
            input.status.as_str(),
            now(),
        ),
    )?;

    get_lesson(conn, &id)?.ok_or(StoreError::NotFound("lesson"))
}

pub fn update_lesson(
    conn: &Connection,
    teacher_id: &str,
    lesson_id: &str,
    patch: LessonPatch,
) -> Result<Lesson, StoreError> {
    // Ownership is part of the lookup: a lesson belonging to another
    // teacher behaves exactly like a missing one.
    let existing = get_lesson(conn, lesson_id)?
        .filter(|l| l.teacher_id == teacher_id)
        .ok_or(StoreError::NotFound("lesson"))?;

    let mut merged = LessonInput {
        student_id: patch.student_id.unwrap_or(existing.student_id),
        subject: patch.subject.unwrap_or(existing.subject),
        lesson_date: patch.lesson_date.unwrap_or(existing.lesson_date),
        start_time: patch.start_time.unwrap_or(existing.start_time),
        end_time: patch.end_time.unwrap_or(existing.end_time),
        description: patch.description.unwrap_or(existing.description),
        meeting_link: patch.meeting_link.unwrap_or(existing.meeting_link),
        notes: patch.notes.unwrap_or(existing.notes),
        status: patch.status.unwrap_or(existing.status),
    };
    validate_lesson(conn, &mut merged)?;

    conn.execute(
        "UPDATE lessons SET student_id = ?, subject = ?, lesson_date = ?,
                            start_time = ?, end_time = ?, description = ?,
                            meeting_link = ?, notes = ?, status = ?
         WHERE id = ? AND teacher_id = ?",
        (
            &merged.student_id,
            &merged.subject,
            &merged.lesson_date,
            &merged.start_time,
            &merged.end_time,
            &merged.description,
            &merged.meeting_link,
            &merged.notes,
            merged.status.as_str(),
            lesson_id,
            teacher_id,
        ),
    )?;

    get_lesson(conn, lesson_id)?.ok_or(StoreError::NotFound("lesson"))
}

pub fn delete_lesson(
    conn: &Connection,
    teacher_id: &str,
    lesson_id: &str,
) -> Result<(), StoreError> {
    let affected = conn.execute(
        "DELETE FROM lessons WHERE id = ? AND teacher_id = ?",
        [lesson_id, teacher_id],
    )?;
    if affected == 0 {
        return Err(StoreError::NotFound("lesson"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Roster

fn map_relation(row: &Row<'_>) -> rusqlite::Result<Relation> {
    Ok(Relation {
        id: row.get(0)?,
        added_at: row.get(1)?,
        student: PersonRef {
            id: row.get(2)?,
            full_name: row.get(3)?,
            email: row.get(4)?,
        },
    })
}

const RELATION_SELECT: &str = "SELECT r.id, r.added_at, s.id, s.full_name, s.email
 FROM teacher_students r
 JOIN profiles s ON s.id = r.student_id";

pub fn list_roster(conn: &Connection, teacher_id: &str) -> Result<Vec<Relation>, StoreError> {
    let sql = format!("{RELATION_SELECT} WHERE r.teacher_id = ? ORDER BY r.added_at DESC, r.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([teacher_id], map_relation)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Exact-match lookup against student profiles. A miss (including an email
/// that belongs to a teacher) is `Ok(None)`, never an error.
pub fn search_student_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<PersonRef>, StoreError> {
    let normalized = normalize_email(email);
    let row = conn
        .query_row(
            "SELECT id, full_name, email FROM profiles WHERE email = ? AND role = 'student'",
            [&normalized],
            |r| {
                Ok(PersonRef {
                    id: r.get(0)?,
                    full_name: r.get(1)?,
                    email: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn add_relation(
    conn: &Connection,
    teacher_id: &str,
    student_id: &str,
) -> Result<Relation, StoreError> {
    match profile_by_id(conn, student_id)? {
        Some(p) if p.role == Role::Student => {}
        _ => return Err(StoreError::NotFound("student")),
    }

    let id = new_id();
    let insert = conn.execute(
        "INSERT INTO teacher_students(id, teacher_id, student_id, added_at) VALUES(?, ?, ?, ?)",
        (&id, teacher_id, student_id, now()),
    );
    if let Err(e) = insert {
        if is_unique_violation(&e) {
            return Err(StoreError::DuplicateRelation);
        }
        return Err(e.into());
    }

    let sql = format!("{RELATION_SELECT} WHERE r.id = ?");
    conn.query_row(&sql, [&id], map_relation)
        .optional()?
        .ok_or(StoreError::NotFound("relation"))
}

pub fn remove_relation(
    conn: &Connection,
    teacher_id: &str,
    relation_id: &str,
) -> Result<(), StoreError> {
    let affected = conn.execute(
        "DELETE FROM teacher_students WHERE id = ? AND teacher_id = ?",
        [relation_id, teacher_id],
    )?;
    if affected == 0 {
        return Err(StoreError::NotFound("relation"));
    }
    Ok(())
}

/// The teacher's linked students flattened for form dropdowns, name-ordered.
pub fn student_options(conn: &Connection, teacher_id: &str) -> Result<Vec<PersonRef>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.full_name, s.email
         FROM teacher_students r
         JOIN profiles s ON s.id = r.student_id
         WHERE r.teacher_id = ?
         ORDER BY s.full_name, s.email",
    )?;
    let rows = stmt
        .query_map([teacher_id], |r| {
            Ok(PersonRef {
                id: r.get(0)?,
                full_name: r.get(1)?,
                email: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
