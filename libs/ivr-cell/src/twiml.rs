use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// A single TwiML verb.
#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    Say(String),
    Gather {
        num_digits: u8,
        action: String,
        prompt: String,
    },
    Redirect(String),
    Hangup,
}

/// Builder for a `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    /// Collects `num_digits` key presses while speaking `prompt`, then posts them to `action`.
    pub fn gather(mut self, num_digits: u8, action: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.verbs.push(Verb::Gather {
            num_digits,
            action: action.into(),
            prompt: prompt.into(),
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    xml.push_str(&format!("<Say>{}</Say>", escape(text)));
                }
                Verb::Gather { num_digits, action, prompt } => {
                    xml.push_str(&format!(
                        r#"<Gather numDigits="{}" action="{}" method="POST"><Say>{}</Say></Gather>"#,
                        num_digits,
                        escape(action),
                        escape(prompt)
                    ));
                }
                Verb::Redirect(url) => {
                    xml.push_str(&format!(r#"<Redirect method="POST">{}</Redirect>"#, escape(url)));
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.to_xml()).into_response()
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
