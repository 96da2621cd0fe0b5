// Static step configuration: stage labels, task kinds, document boilerplate.

use caseflow_contracts::{DocumentType, TaskType};

/// The workflow starts here; step 1 (authentication) is pre-completed when
/// the process instance is created.
pub const FIRST_STEP: i32 = 2;

/// The approval gate.
pub const APPROVAL_STEP: i32 = 5;

/// One past the last configured step; reaching it marks the process terminal.
pub const TERMINAL_STEP: i32 = 6;

pub fn stage_name(step: i32) -> String {
    match step {
        2 => "Step 2: Project Information".to_string(),
        3 => "Step 3: Applicant Document".to_string(),
        4 => "Step 4: Analyst Review".to_string(),
        5 => "Step 5: Approval".to_string(),
        _ => format!("Step {step}"),
    }
}

pub fn task_type_for_step(step: i32) -> TaskType {
    match step {
        3 | 4 => TaskType::Document,
        5 => TaskType::Approval,
        _ => TaskType::Form,
    }
}

pub fn document_type_for_step(step: i32) -> DocumentType {
    if step == 3 {
        DocumentType::Draft
    } else {
        DocumentType::Analysis
    }
}

pub fn document_title(step: i32) -> &'static str {
    if step == 3 {
        "Applicant Draft Document"
    } else {
        "Environmental Analysis"
    }
}

pub fn initial_document_content(step: i32) -> &'static str {
    if step == 3 {
        "# Project Analysis Document\n\n\
         ## Executive Summary\n[Provide a brief overview of the project]\n\n\
         ## Project Description\n[Describe the project in detail]\n\n\
         ## Environmental Considerations\n[List any environmental factors to consider]\n\n\
         ## Supporting Documentation\n[Reference any supporting documents]\n"
    } else {
        "# Environmental Review Analysis\n\n\
         ## Review Summary\n[Summarize the environmental review findings]\n\n\
         ## Compliance Assessment\n[Assess compliance with applicable regulations]\n\n\
         ## Recommendations\n[Provide recommendations]\n\n\
         ## Conclusion\n[State the conclusion of the analysis]\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_types_by_step() {
        assert_eq!(task_type_for_step(2), TaskType::Form);
        assert_eq!(task_type_for_step(3), TaskType::Document);
        assert_eq!(task_type_for_step(4), TaskType::Document);
        assert_eq!(task_type_for_step(5), TaskType::Approval);
    }

    #[test]
    fn stage_names_cover_configured_steps() {
        assert_eq!(stage_name(2), "Step 2: Project Information");
        assert_eq!(stage_name(5), "Step 5: Approval");
        assert_eq!(stage_name(7), "Step 7");
    }

    #[test]
    fn document_templates_by_step() {
        assert!(initial_document_content(3).starts_with("# Project Analysis Document"));
        assert!(initial_document_content(4).starts_with("# Environmental Review Analysis"));
        assert_eq!(document_type_for_step(3), DocumentType::Draft);
        assert_eq!(document_type_for_step(4), DocumentType::Analysis);
    }
}
