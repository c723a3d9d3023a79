use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<LessonStatus> {
        match raw {
            "scheduled" => Some(LessonStatus::Scheduled),
            "completed" => Some(LessonStatus::Completed),
            "cancelled" => Some(LessonStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: String,
}

/// Joined identifier/name/email triple embedded in lesson and roster rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub full_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub subject: String,
    pub lesson_date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: LessonStatus,
    pub created_at: String,
    pub teacher: PersonRef,
    pub student: PersonRef,
}

impl Lesson {
    /// Sort key used everywhere lessons are ordered: ascending date, then
    /// start time. Both are zero-padded ISO strings, so string order is
    /// chronological order.
    pub fn sort_key(&self) -> (String, String) {
        (self.lesson_date.clone(), self.start_time.clone())
    }

    /// Row as seen by the given role. Students never see teacher notes and
    /// only get the meeting link while the lesson is still scheduled.
    pub fn viewed_by(&self, role: Role) -> Lesson {
        let mut row = self.clone();
        if role == Role::Student {
            row.notes = None;
            if row.status != LessonStatus::Scheduled {
                row.meeting_link = None;
            }
        }
        row
    }
}

/// One roster link, joined with the student it points at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    pub added_at: String,
    pub student: PersonRef,
}
