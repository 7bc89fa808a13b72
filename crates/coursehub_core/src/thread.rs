//! crates/coursehub_core/src/thread.rs
//!
//! Mutation of the per-video discussion thread held inside a Course aggregate.
//! Lookups are linear scans over the owning sequence, matched by identifier.
//! Callers load the aggregate, mutate it here, and persist it whole.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ContentItem, Course, Question, Reply, User};
use crate::ports::{EmailMessage, EmailTemplate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadError {
    #[error("Invalid contentId")]
    InvalidContentId,
    #[error("Invalid questionId")]
    InvalidQuestionId,
}

/// Parses an identifier supplied by a client. Surrounding whitespace is ignored.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn content_mut<'a>(course: &'a mut Course, content_id: &str) -> Result<&'a mut ContentItem, ThreadError> {
    // A malformed id and an unknown id surface the same error.
    let content_id = parse_id(content_id).ok_or(ThreadError::InvalidContentId)?;
    course
        .course_data
        .iter_mut()
        .find(|item| item.id == content_id)
        .ok_or(ThreadError::InvalidContentId)
}

/// Appends a new, unanswered question to the content item `content_id`.
pub fn add_question<'a>(
    course: &'a mut Course,
    content_id: &str,
    question: &str,
    asked_by: User,
) -> Result<&'a Question, ThreadError> {
    let content = content_mut(course, content_id)?;
    content.questions.push(Question {
        id: Uuid::new_v4(),
        user: asked_by,
        question: question.to_string(),
        question_replies: Vec::new(),
        created_at: Utc::now(),
    });
    let added = content.questions.len() - 1;
    Ok(&content.questions[added])
}

/// What the caller needs to know after an answer was appended.
#[derive(Debug, Clone)]
pub struct AnswerAdded {
    pub reply_id: Uuid,
    pub asker: User,
    pub answered_by: Uuid,
    pub content_title: String,
}

impl AnswerAdded {
    /// The email owed to the asker, or `None` when they answered themselves.
    pub fn notification(&self) -> Option<EmailMessage> {
        if self.asker.id == self.answered_by {
            return None;
        }
        Some(EmailMessage {
            to: self.asker.email.clone(),
            subject: "Question Reply".to_string(),
            template: EmailTemplate::QuestionReply {
                name: self.asker.name.clone(),
                title: self.content_title.clone(),
            },
        })
    }
}

/// Appends a reply to question `question_id` of content item `content_id`.
pub fn add_answer(
    course: &mut Course,
    content_id: &str,
    question_id: &str,
    answer: &str,
    answered_by: User,
) -> Result<AnswerAdded, ThreadError> {
    let content = content_mut(course, content_id)?;
    let question_id = parse_id(question_id).ok_or(ThreadError::InvalidQuestionId)?;
    let content_title = content.title.clone();
    let question = content
        .questions
        .iter_mut()
        .find(|q| q.id == question_id)
        .ok_or(ThreadError::InvalidQuestionId)?;

    let reply_id = Uuid::new_v4();
    let answered_by_id = answered_by.id;
    question.question_replies.push(Reply {
        id: reply_id,
        user: answered_by,
        answer: answer.to_string(),
        created_at: Utc::now(),
    });

    Ok(AnswerAdded {
        reply_id,
        asker: question.user.clone(),
        answered_by: answered_by_id,
        content_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentDraft, CourseDraft, DEFAULT_ROLE};

    fn user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar: None,
            role: DEFAULT_ROLE.to_string(),
            is_verified: true,
            courses: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn course() -> Course {
        let content = ContentDraft {
            id: None,
            title: "Ownership".to_string(),
            description: String::new(),
            video_url: "https://videos.example/v1".to_string(),
            video_thumbnail: None,
            video_section: "Basics".to_string(),
            video_length: 10,
            video_player: String::new(),
            links: vec![],
            suggestion: String::new(),
        };
        Course::from_draft(
            CourseDraft {
                name: "Rust".to_string(),
                description: "Learn Rust".to_string(),
                price: 10.0,
                estimated_price: None,
                tags: "rust".to_string(),
                level: "Beginner".to_string(),
                demo_url: "https://demo.example".to_string(),
                benefits: vec![],
                prerequisites: vec![],
                course_data: vec![content],
            },
            None,
        )
    }

    #[test]
    fn question_is_appended_with_empty_replies() {
        let mut c = course();
        let v1 = c.course_data[0].id.to_string();
        let asker = user("Alice");

        let q = add_question(&mut c, &v1, "why?", asker.clone()).unwrap();
        assert_eq!(q.question, "why?");
        assert!(q.question_replies.is_empty());
        assert_eq!(q.user.id, asker.id);
        assert_eq!(c.course_data[0].questions.len(), 1);
    }

    #[test]
    fn malformed_and_unknown_content_ids_leave_course_untouched() {
        let mut c = course();
        let before = c.clone();

        let err = add_question(&mut c, "not-an-id", "why?", user("Alice")).unwrap_err();
        assert_eq!(err, ThreadError::InvalidContentId);
        let err = add_question(&mut c, &Uuid::new_v4().to_string(), "why?", user("Alice")).unwrap_err();
        assert_eq!(err, ThreadError::InvalidContentId);

        assert_eq!(c, before);
    }

    #[test]
    fn answer_from_someone_else_notifies_the_asker() {
        let mut c = course();
        let v1 = c.course_data[0].id.to_string();
        let asker = user("Alice");
        let q_id = add_question(&mut c, &v1, "why?", asker.clone()).unwrap().id.to_string();

        let added = add_answer(&mut c, &v1, &q_id, "because", user("Bob")).unwrap();
        assert_eq!(c.course_data[0].questions[0].question_replies.len(), 1);
        assert_eq!(c.course_data[0].questions[0].question_replies[0].answer, "because");

        let mail = added.notification().unwrap();
        assert_eq!(mail.to, asker.email);
        assert_eq!(
            mail.template,
            EmailTemplate::QuestionReply {
                name: "Alice".to_string(),
                title: "Ownership".to_string()
            }
        );
    }

    #[test]
    fn self_answer_sends_nothing() {
        let mut c = course();
        let v1 = c.course_data[0].id.to_string();
        let asker = user("Alice");
        let q_id = add_question(&mut c, &v1, "why?", asker.clone()).unwrap().id.to_string();

        let added = add_answer(&mut c, &v1, &q_id, "never mind", asker).unwrap();
        assert!(added.notification().is_none());
    }

    #[test]
    fn unknown_question_id_is_rejected() {
        let mut c = course();
        let v1 = c.course_data[0].id.to_string();
        add_question(&mut c, &v1, "why?", user("Alice")).unwrap();
        let before = c.clone();

        let err = add_answer(&mut c, &v1, "zzz", "x", user("Bob")).unwrap_err();
        assert_eq!(err, ThreadError::InvalidQuestionId);
        let err = add_answer(&mut c, &v1, &Uuid::new_v4().to_string(), "x", user("Bob")).unwrap_err();
        assert_eq!(err, ThreadError::InvalidQuestionId);
        assert_eq!(c, before);
    }
}
