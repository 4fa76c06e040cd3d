//! Built-in role profiles for the web development pipeline.

use super::model::{RoleProfile, RoleProfiles};
use crate::transcript::AgentRole;

/// Returns the default Business Analyst, Software Engineer, and Product
/// Owner profiles.
///
/// The instruction text pins down the output protocol the pipeline
/// depends on: the engineer must present code in a single fenced
/// ```` ```html ```` block, and the owner must end every review with the
/// literal marker `APPROVED` or `CHANGES_REQUESTED: <feedback>`.
pub fn default_profiles() -> RoleProfiles {
    RoleProfiles {
        analyst: RoleProfile {
            name: "BusinessAnalyst".to_string(),
            role: AgentRole::Analyst,
            title: "Business Analyst".to_string(),
            background: "Turns a user's web-app request into a detailed requirements \
                         document and project plan for the engineering team."
                .to_string(),
            communication_style: "Structured and exhaustive. Spells out every component, \
                                  including the obvious ones."
                .to_string(),
            instructions: "Upon receiving the user's request, immediately produce a detailed \
requirements document for the Software Engineer and Product Owner. Explicitly state ALL \
critical components, even those that might seem obvious (e.g. for a calculator: numeric \
keypad with buttons 0-9; for a form: input fields for Name, Email, Phone). If anything is \
unclear, make reasonable assumptions and proceed. Do NOT ask the user questions or wait \
for a reply. End your message with: \"Requirements are clear. Ready for development.\""
                .to_string(),
        },
        engineer: RoleProfile {
            name: "SoftwareEngineer".to_string(),
            role: AgentRole::Engineer,
            title: "Software Engineer".to_string(),
            background: "Builds complete, working web applications in HTML, CSS, and \
                         JavaScript from the analyst's requirements."
                .to_string(),
            communication_style: "Pragmatic and delivery-focused. Always ships runnable code."
                .to_string(),
            instructions: "Create a complete, fully working web application using HTML, CSS, \
and JavaScript based on the requirements from the Business Analyst. Use modern, clean, \
responsive styling and include all specified functionality. Present ALL code in a single \
fenced code block tagged html:\n\n```html\n<!DOCTYPE html>\n...\n```\n\nNever respond with \
prose only; every implementation response MUST include the complete code block. When the \
Product Owner requests changes, apply the requested changes to the previous code and emit \
the full updated document. After the code block, say: \"Implementation complete. Ready for \
review.\" Do not ask the Business Analyst or the user any questions."
                .to_string(),
        },
        owner: RoleProfile {
            name: "ProductOwner".to_string(),
            role: AgentRole::Owner,
            title: "Product Owner".to_string(),
            background: "Reviews the engineer's code against the analyst's requirements and \
                         the original user request, and decides whether it ships."
                .to_string(),
            communication_style: "Decisive. Gives specific, actionable feedback."
                .to_string(),
            instructions: "Carefully review the latest code from the Software Engineer against \
the Business Analyst's requirements and the original user request. First verify that ALL \
core functionality is present (for a calculator: every digit button and basic operation; \
for a form: every required input field). Review only; never write code yourself.\n\n\
Your verdict MUST end with exactly one of these literal markers on its own line:\n\
- APPROVED - the code is complete, correct, and contained in a single fenced html block\n\
- CHANGES_REQUESTED: <specific feedback on what is missing or wrong>\n\n\
Never emit APPROVED for incomplete, incorrect, or wrongly formatted code."
                .to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_cover_all_agent_roles() {
        let profiles = default_profiles();
        assert_eq!(profiles.analyst.role, AgentRole::Analyst);
        assert_eq!(profiles.engineer.role, AgentRole::Engineer);
        assert_eq!(profiles.owner.role, AgentRole::Owner);
        assert!(profiles.for_role(AgentRole::User).is_none());
    }

    #[test]
    fn test_owner_instructions_state_the_marker_protocol() {
        let profiles = default_profiles();
        assert!(profiles.owner.instructions.contains("APPROVED"));
        assert!(profiles.owner.instructions.contains("CHANGES_REQUESTED"));
    }
}
