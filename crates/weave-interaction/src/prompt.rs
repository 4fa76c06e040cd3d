//! Prompt rendering for role personas.
//!
//! Each backend call is assembled from two rendered parts: a persona
//! prompt built from the role profile (sent as the system message) and
//! the conversation history (sent as the user message). Templates are
//! compiled once into a shared environment.

use minijinja::{Environment, context};
use once_cell::sync::Lazy;
use weave_core::backend::BackendError;
use weave_core::persona::RoleProfile;
use weave_core::transcript::Turn;

const ROLE_PROMPT_TEMPLATE: &str = "\
# Persona Profile
**Name**: {{ name }}
**Role**: {{ title }}

## Background
{{ background }}

## Communication Style
{{ communication_style }}

## Instructions
{{ instructions }}
";

const HISTORY_TEMPLATE: &str = "\
# Conversation History
{% for turn in turns %}
**{{ turn.speaker }}**: {{ turn.content }}
{% endfor %}
Respond as your persona with your next contribution.
";

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("role_prompt", ROLE_PROMPT_TEMPLATE)
        .expect("role prompt template must parse");
    env.add_template("history", HISTORY_TEMPLATE)
        .expect("history template must parse");
    env
});

/// Renders the persona system prompt for one role profile.
pub fn render_role_prompt(profile: &RoleProfile) -> Result<String, BackendError> {
    let template = TEMPLATES
        .get_template("role_prompt")
        .map_err(|err| BackendError::NotConfigured(err.to_string()))?;
    template
        .render(context! {
            name => profile.name,
            title => profile.title,
            background => profile.background,
            communication_style => profile.communication_style,
            instructions => profile.instructions,
        })
        .map_err(|err| BackendError::request_failed(format!("prompt render failed: {err}"), false))
}

/// Renders the conversation history as the user message body.
pub fn render_history(history: &[Turn]) -> Result<String, BackendError> {
    let turns: Vec<_> = history
        .iter()
        .map(|turn| {
            context! {
                speaker => turn.role.display_name(),
                content => turn.content,
            }
        })
        .collect();

    let template = TEMPLATES
        .get_template("history")
        .map_err(|err| BackendError::NotConfigured(err.to_string()))?;
    template
        .render(context! { turns => turns })
        .map_err(|err| BackendError::request_failed(format!("prompt render failed: {err}"), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::persona::default_profiles;
    use weave_core::transcript::AgentRole;

    #[test]
    fn test_role_prompt_carries_instructions() {
        let profiles = default_profiles();
        let prompt = render_role_prompt(&profiles.engineer).unwrap();
        assert!(prompt.starts_with("# Persona Profile"));
        assert!(prompt.contains("**Name**: SoftwareEngineer"));
        assert!(prompt.contains("```html"));
    }

    #[test]
    fn test_history_lists_turns_in_order() {
        let history = vec![
            Turn::new(AgentRole::User, "Build a calculator", 0),
            Turn::new(AgentRole::Analyst, "Requirements gathered.", 0),
        ];
        let rendered = render_history(&history).unwrap();

        let user_pos = rendered.find("**User**: Build a calculator").unwrap();
        let analyst_pos = rendered
            .find("**BusinessAnalyst**: Requirements gathered.")
            .unwrap();
        assert!(user_pos < analyst_pos);
    }
}
