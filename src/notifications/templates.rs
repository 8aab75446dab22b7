use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const INCIDENT_TITLE: &str = "incident_title";
const INCIDENT_MESSAGE: &str = "incident_message";

#[derive(Debug, Serialize)]
pub struct IncidentNotice<'a> {
    pub learner_name: &'a str,
    pub action_name: &'a str,
    pub occurred_at: String,
    pub description: &'a str,
}

/// Rendered notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub title: String,
    pub message: String,
}

pub struct NotificationTemplates {
    registry: Handlebars<'static>,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string(
            INCIDENT_TITLE,
            "Disciplinary incident: {{learner_name}}",
        )?;
        registry.register_template_string(
            INCIDENT_MESSAGE,
            "{{learner_name}} was involved in a disciplinary incident on {{occurred_at}}.\n\
             Action taken: {{action_name}}\n\
             {{description}}",
        )?;
        Ok(Self { registry })
    }

    pub fn incident(&self, notice: &IncidentNotice<'_>) -> Result<RenderedNotice, RenderError> {
        Ok(RenderedNotice {
            title: self.registry.render(INCIDENT_TITLE, notice)?,
            message: self.registry.render(INCIDENT_MESSAGE, notice)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_notice_is_rendered_verbatim() {
        let templates = NotificationTemplates::new().unwrap();
        let rendered = templates
            .incident(&IncidentNotice {
                learner_name: "Ada <Lovelace>",
                action_name: "Detention",
                occurred_at: "2026-03-01 09:30".into(),
                description: "Talking in class",
            })
            .unwrap();
        assert_eq!(rendered.title, "Disciplinary incident: Ada <Lovelace>");
        assert!(rendered.message.starts_with("Ada <Lovelace> was involved"));
        assert!(rendered.message.contains("Action taken: Detention"));
        assert!(rendered.message.ends_with("Talking in class"));
    }
}
