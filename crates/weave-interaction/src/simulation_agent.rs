//! Deterministic simulation backend.
//!
//! Stands in for the model endpoint during offline runs and tests.
//! Every role produces protocol-conformant output derived only from the
//! transcript, so a simulated pipeline always reaches approval in one
//! pass and never touches the network.

use async_trait::async_trait;
use tracing::debug;
use weave_core::backend::{BackendError, ModelBackend};
use weave_core::persona::RoleProfile;
use weave_core::transcript::{AgentRole, Turn};

/// Backend that fabricates protocol-conformant agent output locally.
#[derive(Debug, Clone, Default)]
pub struct SimulationAgent;

impl SimulationAgent {
    pub fn new() -> Self {
        Self
    }

    fn analyst_output(request: &str) -> String {
        format!(
            "Requirements for: {request}\n\n\
             1. Single-page web application delivered as one HTML document.\n\
             2. All styling inline in a <style> element; responsive layout.\n\
             3. All behavior inline in a <script> element; no external assets.\n\
             4. Core interaction implemented by a calculateResult function wired to the page controls.\n\n\
             Requirements are clear. Ready for development."
        )
    }

    fn engineer_output(request: &str) -> String {
        format!(
            "Here is the implementation.\n\n\
             ```html\n\
             <!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>{request}</title>\n\
             <style>body {{ font-family: sans-serif; margin: 2rem; }}</style>\n\
             </head>\n\
             <body>\n\
             <h1>{request}</h1>\n\
             <input id=\"input\" type=\"text\">\n\
             <button onclick=\"calculateResult()\">Go</button>\n\
             <p id=\"result\"></p>\n\
             <script>\n\
             function calculateResult() {{\n\
               document.getElementById('result').textContent =\n\
                 document.getElementById('input').value;\n\
             }}\n\
             </script>\n\
             </body>\n\
             </html>\n\
             ```\n\n\
             Implementation complete. Ready for review."
        )
    }

    fn owner_output() -> String {
        "The implementation covers the stated requirements in a single fenced html block.\n\nAPPROVED".to_string()
    }
}

#[async_trait]
impl ModelBackend for SimulationAgent {
    async fn complete(
        &self,
        profile: &RoleProfile,
        history: &[Turn],
    ) -> Result<String, BackendError> {
        let request = history
            .iter()
            .find(|turn| turn.role == AgentRole::User)
            .map(|turn| turn.content.clone())
            .unwrap_or_else(|| "Untitled web app".to_string());

        debug!(agent = profile.name, "producing simulated completion");

        let output = match profile.role {
            AgentRole::Analyst => Self::analyst_output(&request),
            AgentRole::Engineer => Self::engineer_output(&request),
            AgentRole::Owner => Self::owner_output(),
            AgentRole::User => {
                return Err(BackendError::NotConfigured(
                    "the user role has no simulated agent".into(),
                ));
            }
        };

        Ok(output)
    }
}
