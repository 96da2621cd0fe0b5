// Workflow engine for the five-step environmental review process
//
// Steps: 1 authentication (pre-completed), 2 project information form,
// 3 applicant draft document, 4 analyst review document, 5 approval gate.
// Step 6 is the terminal marker. The only backward transition is 5 -> 4,
// taken when an approver requests changes.

pub mod access;
pub mod engine;
pub mod error;
pub mod steps;

pub use engine::WorkflowEngine;
pub use error::{Result, WorkflowError};
