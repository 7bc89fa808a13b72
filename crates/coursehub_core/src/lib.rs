pub mod domain;
pub mod ports;
pub mod thread;

pub use domain::{
    ContentItem, Course, CourseDraft, CoursePatch, CoursePreview, ImageRef, NewUser, Question,
    Reply, User, UserCredentials,
};
pub use ports::{
    CacheService, CourseStore, EmailMessage, EmailService, EmailTemplate, ImageHost, PortError,
    PortResult, UploadOptions, UserStore,
};
pub use thread::{add_answer, add_question, AnswerAdded, ThreadError};
