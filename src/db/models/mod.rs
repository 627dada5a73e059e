pub mod session;
pub mod shot;

pub use session::{Point, SessionDraft, SessionRecord, SessionSummary, ShotMetrics, SkillLevel};
pub use shot::Shot;
