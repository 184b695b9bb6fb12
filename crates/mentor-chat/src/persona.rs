use mentor_core::config::PersonaConfig;

/// Student profile the tutor adapts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub grade: String,
    pub personality: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self::from(&PersonaConfig::default())
    }
}

impl From<&PersonaConfig> for Persona {
    fn from(config: &PersonaConfig) -> Self {
        Self {
            grade: config.grade.clone(),
            personality: config.personality.clone(),
        }
    }
}

impl Persona {
    /// Fill missing or blank values from `defaults`.
    pub fn resolve(grade: Option<&str>, personality: Option<&str>, defaults: &PersonaConfig) -> Self {
        let pick = |value: Option<&str>, fallback: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            grade: pick(grade, &defaults.grade),
            personality: pick(personality, &defaults.personality),
        }
    }

    /// The system instruction that seeds every transcript.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are an educational tutor for a student in {grade}. Your personality is \
             {personality}; keep that tone and pitch vocabulary and examples at the \
             student's level. Answer step by step: each step has a short heading, an \
             explanation, and the intermediate output it produces. Finish with a one-line \
             final answer.",
            personality = self.personality.to_lowercase(),
            grade = self.grade,
        )
    }
}
