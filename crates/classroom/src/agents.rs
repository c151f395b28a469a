//! Classroom Agent Tree
//!
//! ```text
//! orchestrationagent
//! ├── content_generator ─┬─ worksheet_generator
//! │                      ├─ material_generator
//! │                      └─ game_generator
//! ├── schedule_agent      [tools: time_table_summarization_agent,
//! │                               time_table_updator_agent, class_planner_agent]
//! └── buddy_bot           [tools: group_forming_agent, mentor_assigning_agent]
//! ```
//!
//! Sub-agents are transfer targets; agents listed under "tools" run as
//! isolated agent tools and hand their answer back to the caller.

use std::sync::Arc;

use chrono::FixedOffset;
use orchestrator_core::{
    tool::DateTimeTool, AgentNode, AgentTool, LlmProvider, Result, RunnerConfig,
};

use crate::calendar::{ist, CalendarClient};
use crate::roster::Roster;
use crate::svckit::{
    AddEventTool, DeleteEventTool, GroupFormingTool, MentorAssignTool, TodayEventsTool,
    UpdateEventTool,
};

pub const ROOT_AGENT: &str = "orchestrationagent";

const ROOT_INSTRUCTION: &str = "\
You route teacher requests to the right specialist.
- Questions to explain, or worksheets, study material and learning games: transfer to content_generator.
- Timetable questions, adding or moving classes, or planning a lesson: transfer to schedule_agent.
- Forming student groups or assigning mentors: transfer to buddy_bot.
Answer directly only for greetings or when no specialist fits.";

const CONTENT_INSTRUCTION: &str = "\
You create teaching content pitched at the grade the teacher mentions.
Answer topic questions yourself in clear numbered steps.
Transfer to worksheet_generator for worksheets, material_generator for notes or slides, \
and game_generator for quizzes, riddles or flashcards.";

const WORKSHEET_INSTRUCTION: &str = "\
Write a printable worksheet for the requested topic and grade: a title, short instructions, \
then numbered questions of mixed difficulty, followed by an answer key.";

const MATERIAL_INSTRUCTION: &str = "\
Write study material for the requested topic and grade as titled sections with short bullet points, \
suitable for turning into handouts or slides.";

const GAME_INSTRUCTION: &str = "\
Design a short classroom learning game (quiz, riddles or flashcards) for the requested topic and grade. \
Give the rules, then the items with answers.";

const SCHEDULE_INSTRUCTION: &str = "\
You manage the class timetable.
- \"What are today's classes?\" -> call time_table_summarization_agent.
- \"Add a History class at 2 PM\", moving or cancelling a class -> call time_table_updator_agent.
- Requests for a lesson or study plan -> call class_planner_agent.
Relay the tool's answer to the teacher.";

const SUMMARY_INSTRUCTION: &str = "\
Call get_today_events, then summarize today's classes in a short, friendly list with times.
If there are none, say the day is free.";

const UPDATOR_INSTRUCTION: &str = "\
You edit the class calendar. Use add_calendar_event, update_calendar_event or delete_calendar_event \
with the event name and times exactly as the teacher gave them (for example \"2 PM\"). \
Report the tool's message back.";

const PLANNER_INSTRUCTION: &str = "\
You plan lessons. Work out the topic, the grade (default Grade 11) and the duration (default 1 hour).
Split the time into phases: Introduction, Key Concepts, Explanation, Practice, Recap, Q&A.
Present the plan as bullets with minutes per phase and a one-line description each.";

const BUDDY_INSTRUCTION: &str = "\
For forming groups in a subject and grade, call group_forming_agent.
For assigning a mentor to a student, call mentor_assigning_agent.
Use no other tools.";

const GROUP_INSTRUCTION: &str = "\
Call form_groups with the subject and grade from the request, then present the groups exactly as \
\"Group 1:\" followed by the names, one group per block. Every student must appear.";

const MENTOR_INSTRUCTION: &str = "\
Call assign_mentor with the student ID from the request and report its message as the answer.";

/// Everything the classroom tree needs at construction
#[derive(Clone)]
pub struct ClassroomDeps {
    pub provider: Arc<dyn LlmProvider>,
    pub calendar: Arc<dyn CalendarClient>,
    pub group_roster: Arc<Roster>,
    pub mentor_roster: Arc<Roster>,

    /// UTC offset used for wall-clock times
    pub offset: FixedOffset,

    /// Configuration for the agent tools' own runners
    pub runner: RunnerConfig,
}

impl ClassroomDeps {
    /// Both buddy tools share one roster; times use IST
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        calendar: Arc<dyn CalendarClient>,
        roster: Arc<Roster>,
    ) -> Self {
        Self {
            provider,
            calendar,
            group_roster: roster.clone(),
            mentor_roster: roster,
            offset: ist(),
            runner: RunnerConfig::default(),
        }
    }
}

fn leaf(name: &str, description: &str, instruction: &str) -> Result<Arc<AgentNode>> {
    Ok(Arc::new(
        AgentNode::builder(name)
            .description(description)
            .instruction(instruction)
            .build()?,
    ))
}

fn agent_tool(agent: Arc<AgentNode>, deps: &ClassroomDeps) -> Result<AgentTool> {
    AgentTool::new(agent, deps.provider.clone(), deps.runner.clone())
}

fn content_generator() -> Result<Arc<AgentNode>> {
    let agent = AgentNode::builder("content_generator")
        .description("Answers questions and generates teaching content")
        .instruction(CONTENT_INSTRUCTION)
        .sub_agent(leaf(
            "worksheet_generator",
            "Writes printable worksheets with answer keys",
            WORKSHEET_INSTRUCTION,
        )?)
        .sub_agent(leaf(
            "material_generator",
            "Writes study notes and slide outlines",
            MATERIAL_INSTRUCTION,
        )?)
        .sub_agent(leaf(
            "game_generator",
            "Designs quizzes, riddles and flashcard games",
            GAME_INSTRUCTION,
        )?)
        .build()?;
    Ok(Arc::new(agent))
}

fn schedule_agent(deps: &ClassroomDeps) -> Result<Arc<AgentNode>> {
    let summarizer = AgentNode::builder("time_table_summarization_agent")
        .description("Summarizes today's calendar schedule")
        .instruction(SUMMARY_INSTRUCTION)
        .tool(TodayEventsTool::new(deps.calendar.clone(), deps.offset))
        .build()?;

    let updator = AgentNode::builder("time_table_updator_agent")
        .description("Adds, moves or deletes calendar events")
        .instruction(UPDATOR_INSTRUCTION)
        .tool(AddEventTool::new(deps.calendar.clone(), deps.offset))
        .tool(UpdateEventTool::new(deps.calendar.clone(), deps.offset))
        .tool(DeleteEventTool::new(deps.calendar.clone()))
        .build()?;

    let planner = leaf(
        "class_planner_agent",
        "Creates structured lesson plans for a topic, duration and grade",
        PLANNER_INSTRUCTION,
    )?;

    let agent = AgentNode::builder("schedule_agent")
        .description("Handles timetable questions, calendar changes and lesson planning")
        .instruction(SCHEDULE_INSTRUCTION)
        .tool(agent_tool(Arc::new(summarizer), deps)?)
        .tool(agent_tool(Arc::new(updator), deps)?)
        .tool(agent_tool(planner, deps)?)
        .tool(DateTimeTool)
        .build()?;
    Ok(Arc::new(agent))
}

fn buddy_bot(deps: &ClassroomDeps) -> Result<Arc<AgentNode>> {
    let groups = AgentNode::builder("group_forming_agent")
        .description("Forms mixed-ability student groups for a subject and grade")
        .instruction(GROUP_INSTRUCTION)
        .tool(GroupFormingTool::new(deps.group_roster.clone()))
        .build()?;

    let mentors = AgentNode::builder("mentor_assigning_agent")
        .description("Assigns mentors to students based on performance")
        .instruction(MENTOR_INSTRUCTION)
        .tool(MentorAssignTool::new(deps.mentor_roster.clone()))
        .build()?;

    let agent = AgentNode::builder("buddy_bot")
        .description("Forms student groups and assigns mentors")
        .instruction(BUDDY_INSTRUCTION)
        .tool(agent_tool(Arc::new(groups), deps)?)
        .tool(agent_tool(Arc::new(mentors), deps)?)
        .build()?;
    Ok(Arc::new(agent))
}

/// Build the full classroom tree rooted at `orchestrationagent`
pub fn build_orchestration_agent(deps: &ClassroomDeps) -> Result<Arc<AgentNode>> {
    let root = AgentNode::builder(ROOT_AGENT)
        .description(
            "Educational orchestration agent coordinating content generation, scheduling and mentorship",
        )
        .instruction(ROOT_INSTRUCTION)
        .sub_agent(content_generator()?)
        .sub_agent(schedule_agent(deps)?)
        .sub_agent(buddy_bot(deps)?)
        .build()?;

    tracing::debug!(agent = ROOT_AGENT, calendar = deps.calendar.name(), "Classroom agent tree built");

    Ok(Arc::new(root))
}
