use crate::specialists::Specialist;

pub const USER_MESSAGE_PLACEHOLDER: &str = "{userMessage}";
pub const SPECIALISTS_PLACEHOLDER: &str = "{specialistsText}";

/// Renders the language-model prompt for a contact request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill the template with the specialist list and the user text.
    ///
    /// Specialists go in first so placeholder text typed by a user is left
    /// as is. A template without a placeholder simply drops that value.
    pub fn build(&self, user_text: &str, specialists: &[Specialist]) -> String {
        self.template
            .replace(SPECIALISTS_PLACEHOLDER, &render_specialists(specialists))
            .replace(USER_MESSAGE_PLACEHOLDER, user_text)
    }
}

fn render_specialists(specialists: &[Specialist]) -> String {
    specialists
        .iter()
        .map(|s| {
            format!(
                "- {}, {}, {}, {}",
                s.phone, s.name, s.services, s.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
