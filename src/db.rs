use rusqlite::Connection;
use std::path::Path;

/// Open (and create if needed) the backing store at `path`, applying the
/// schema. Constraints mirror the hosted deployment: unique emails, a
/// unique (teacher, student) roster pair, and the lesson time-ordering
/// check at the data layer in addition to handler-side validation.
pub fn open_store(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT,
            role TEXT NOT NULL CHECK(role IN ('teacher','student')),
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role)",
        [],
    )?;

    // Identity rows for the embedded auth provider. The hosted deployment
    // keeps these in the external auth service; the substitute owns them.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_users(
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teacher_students(
            id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            added_at TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES profiles(id),
            FOREIGN KEY(student_id) REFERENCES profiles(id),
            UNIQUE(teacher_id, student_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teacher_students_teacher ON teacher_students(teacher_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teacher_students_student ON teacher_students(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lessons(
            id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            subject TEXT NOT NULL,
            lesson_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL CHECK(end_time > start_time),
            description TEXT,
            meeting_link TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'scheduled'
                CHECK(status IN ('scheduled','completed','cancelled')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES profiles(id),
            FOREIGN KEY(student_id) REFERENCES profiles(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lessons_teacher ON lessons(teacher_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lessons_student ON lessons(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lessons_date ON lessons(lesson_date, start_time)",
        [],
    )?;

    Ok(())
}
