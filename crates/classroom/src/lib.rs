//! # classroom
//!
//! Teacher-assistant agents for the classroom orchestrator: the agent tree,
//! calendar tools and student-roster tools.
//!
//! ## Routing
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  "What are today's classes?"   → schedule_agent             │
//! │  "Add a History class at 2 PM" → schedule_agent             │
//! │  "Make a Grade 6 fractions quiz" → content_generator        │
//! │  "Form Maths groups for grade 10" → buddy_bot               │
//! │  "Assign a mentor to student 42" → buddy_bot                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The model behind the orchestrator makes the routing choice; this crate
//! supplies the agents, their instructions and the tools they call.

pub mod agents;
pub mod calendar;
pub mod error;
pub mod model;
pub mod roster;
pub mod svckit;

pub use agents::{build_orchestration_agent, ClassroomDeps, ROOT_AGENT};
pub use calendar::{CalendarClient, GoogleCalendarClient, GoogleCalendarConfig, MemoryCalendar};
pub use error::{ClassroomError, Result};
pub use model::{CalendarEvent, Performance, Student};
pub use roster::{MentorOutcome, Roster};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        AddEventTool, DeleteEventTool, GroupFormingTool, MentorAssignTool, TodayEventsTool,
        UpdateEventTool,
    };
}
