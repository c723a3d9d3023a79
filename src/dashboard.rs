use crate::model::{Lesson, LessonStatus, Relation, Role};
use crate::store::{self, StoreError};
use rusqlite::Connection;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Ready => "ready",
        }
    }
}

/// Teacher view state. Both collections are loaded once on open; every
/// successful mutation reconciles the in-memory copy from the mutation's
/// authoritative return value instead of re-fetching. A failed mutation
/// never touches this state.
pub struct TeacherDashboard {
    pub teacher_id: String,
    phase: Phase,
    lessons: Vec<Lesson>,
    roster: Vec<Relation>,
}

impl TeacherDashboard {
    /// Initial load. Both fetches belong to one load step: if either
    /// fails, the dashboard stays unopened.
    pub fn open(conn: &Connection, teacher_id: &str) -> Result<Self, StoreError> {
        let mut dash = TeacherDashboard {
            teacher_id: teacher_id.to_string(),
            phase: Phase::Loading,
            lessons: Vec::new(),
            roster: Vec::new(),
        };
        let lessons = store::list_lessons(conn, teacher_id, Role::Teacher, None)?;
        let roster = store::list_roster(conn, teacher_id)?;
        dash.lessons = lessons;
        dash.roster = roster;
        dash.phase = Phase::Ready;
        Ok(dash)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn roster(&self) -> &[Relation] {
        &self.roster
    }

    /// Apply a created or updated lesson returned by the store. Replaces
    /// in place when the id is known, otherwise inserts; the collection is
    /// re-sorted because a date or time edit can move the row.
    pub fn apply_lesson_saved(&mut self, lesson: Lesson) {
        match self.lessons.iter_mut().find(|l| l.id == lesson.id) {
            Some(slot) => *slot = lesson,
            None => self.lessons.push(lesson),
        }
        self.lessons.sort_by_key(|l| (l.sort_key(), l.id.clone()));
        self.phase = Phase::Ready;
    }

    pub fn apply_lesson_removed(&mut self, lesson_id: &str) {
        self.lessons.retain(|l| l.id != lesson_id);
        self.phase = Phase::Ready;
    }

    /// New roster links go to the front: the list is newest-first.
    pub fn apply_relation_added(&mut self, relation: Relation) {
        self.roster.insert(0, relation);
        self.phase = Phase::Ready;
    }

    pub fn apply_relation_removed(&mut self, relation_id: &str) {
        self.roster.retain(|r| r.id != relation_id);
        self.phase = Phase::Ready;
    }

    pub fn scheduled_count(&self) -> usize {
        self.count(LessonStatus::Scheduled)
    }

    pub fn completed_count(&self) -> usize {
        self.count(LessonStatus::Completed)
    }

    fn count(&self, status: LessonStatus) -> usize {
        self.lessons.iter().filter(|l| l.status == status).count()
    }

    pub fn summary(&self) -> serde_json::Value {
        json!({
            "phase": self.phase.as_str(),
            "counts": {
                "scheduled": self.scheduled_count(),
                "completed": self.completed_count(),
                "students": self.roster.len(),
            },
            "lessons": self.lessons,
            "roster": self.roster,
        })
    }
}

/// Student view state: all lessons plus the upcoming subset, read-only.
pub struct StudentDashboard {
    pub student_id: String,
    phase: Phase,
    lessons: Vec<Lesson>,
    upcoming: Vec<Lesson>,
}

impl StudentDashboard {
    pub fn open(conn: &Connection, student_id: &str, today: &str) -> Result<Self, StoreError> {
        let lessons = store::list_lessons(conn, student_id, Role::Student, None)?;
        let upcoming = store::upcoming_lessons(conn, student_id, Role::Student, today)?;
        Ok(StudentDashboard {
            student_id: student_id.to_string(),
            phase: Phase::Ready,
            lessons,
            upcoming,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The single soonest upcoming lesson, surfaced prominently.
    pub fn next_lesson(&self) -> Option<&Lesson> {
        self.upcoming.first()
    }

    pub fn summary(&self) -> serde_json::Value {
        let view = |l: &Lesson| l.viewed_by(Role::Student);
        json!({
            "phase": self.phase.as_str(),
            "counts": {
                "total": self.lessons.len(),
                "scheduled": self
                    .lessons
                    .iter()
                    .filter(|l| l.status == LessonStatus::Scheduled)
                    .count(),
                "completed": self
                    .lessons
                    .iter()
                    .filter(|l| l.status == LessonStatus::Completed)
                    .count(),
            },
            "lessons": self.lessons.iter().map(view).collect::<Vec<_>>(),
            "upcoming": self.upcoming.iter().map(view).collect::<Vec<_>>(),
            "nextLesson": self.next_lesson().map(|l| view(l)),
        })
    }
}
