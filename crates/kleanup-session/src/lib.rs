//! Interactive operator session for kleanup.
//!
//! The session drives one run as an explicit sequence of stages:
//! `ScanPriority -> ResolvePriority -> (ScanAdditional -> ResolveAdditional)
//! -> BuildPlan -> Confirm -> Archive`. The terminal, the free-space source
//! and the archiver are injected, so a whole run can be exercised with
//! scripted answers.

mod console;
mod render;
mod session;

pub use console::{Console, ScriptedConsole, TerminalConsole};
pub use render::render_list;
pub use session::{Phase, PhaseScan, Session, SessionOutcome, Stage};
