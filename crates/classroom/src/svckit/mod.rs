//! Service Kit - Agent Tools
//!
//! Classroom tools implementing `orchestrator_core::Tool`. Every tool turns
//! a `ClassroomError` into a failed `ToolResult` instead of raising it.

mod calendar_update;
mod group_forming;
mod mentor;
mod schedule;

pub use calendar_update::{AddEventTool, DeleteEventTool, UpdateEventTool};
pub use group_forming::GroupFormingTool;
pub use mentor::MentorAssignTool;
pub use schedule::TodayEventsTool;
