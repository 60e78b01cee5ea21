mod bank;
mod ids;
mod mode;
mod question;
mod session;

pub use ids::{ParseIdError, SessionId};

pub use bank::{Bank, BankError, clamp_range};
pub use mode::{ParseModeError, QuizMode};
pub use question::{Question, QuestionError, QuestionRecord};
pub use session::{FinalResult, GradeResult, QuestionView, Session, SessionStateError};
