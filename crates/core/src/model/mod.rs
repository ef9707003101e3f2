mod bank;
mod category;
mod ids;
mod label;
mod question;
mod result;
mod settings;
mod summary;

pub use bank::{BankError, QuestionBank};
pub use category::{Category, CategoryError};
pub use ids::QuestionId;
pub use label::{LABEL_SEPARATOR, LabelError, LabelSet, MAX_OPTIONS, MIN_OPTIONS, OptionLabel};
pub use question::{DisplayOption, PreparedQuestion, QuestionDraft, QuestionError, QuestionRecord};
pub use result::ResultRecord;
pub use settings::{
    DEFAULT_PASS_THRESHOLD_PERCENT, DEFAULT_QUESTION_COUNT, DEFAULT_RECENT_MISTAKES_LIMIT,
    DEFAULT_SECONDS_PER_QUESTION, ExamSettings, ExamSettingsDraft, STANDARD_QUESTION_COUNTS,
    SettingsError,
};
pub use summary::{SessionSummary, SessionSummaryError, SessionTiming};
