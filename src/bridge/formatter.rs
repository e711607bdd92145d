//! Message formatting for display.
//!
//! Handles placeholder substitution in message templates.
//! Supports placeholders: %username%, %discriminator%, %message%

/// A placeholder recognized in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Username,
    Discriminator,
    Message,
}

impl Placeholder {
    /// The literal token as it appears in a template.
    pub fn token(self) -> &'static str {
        match self {
            Self::Username => "%username%",
            Self::Discriminator => "%discriminator%",
            Self::Message => "%message%",
        }
    }
}

/// Ordered set of placeholder values.
///
/// Substitution happens in insertion order, so a value containing a later
/// token will itself be substituted.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    entries: Vec<(Placeholder, String)>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username.
    pub fn with_username(self, username: impl Into<String>) -> Self {
        self.with(Placeholder::Username, username)
    }

    /// Set the discriminator.
    pub fn with_discriminator(self, discriminator: impl Into<String>) -> Self {
        self.with(Placeholder::Discriminator, discriminator)
    }

    /// Set the message.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with(Placeholder::Message, message)
    }

    fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.entries.push((placeholder, value.into()));
        self
    }
}

/// Template that substitutes placeholders in a configured string.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    template: String,
}

impl MessageTemplate {
    /// Create a new template from a format string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template.
    ///
    /// Each placeholder replaces only its first occurrence; later repeats of
    /// the same token stay literal. Tokens without a value are untouched.
    /// Values are inserted verbatim.
    pub fn render(&self, vars: &TemplateVars) -> String {
        vars.entries
            .iter()
            .fold(self.template.clone(), |acc, (placeholder, value)| {
                acc.replacen(placeholder.token(), value, 1)
            })
    }
}
