pub mod action;
pub mod activity;

pub use action::{
    ActionKind, GradeActivityPayload, PostNoticePayload, QueuedAction, ReplayReport,
    SubmitActivityPayload, UserRef,
};
pub use activity::{
    ActivityItem, ActivitySnapshot, GradingConfig, GradingMode, ItemType, SubmissionStatus,
};
