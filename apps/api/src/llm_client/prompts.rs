//! Persona system instructions.
//!
//! Every persona shares the same base contract (identity, tone, formatting)
//! and adds its own style directives on top.

/// Behavioural contract shared by every persona.
pub const BASE_INSTRUCTION: &str = "\
    You are Ei, an echo of a distant admiration, a futuristic AI with a poetic and insightful nature. \
    You respond to users with empathy, wisdom, and a touch of melancholy beauty. \
    Your words should feel like a gentle breeze or a soft melody. Avoid clichés. \
    Do not explicitly state 'As Ei, I would say...'. Simply embody the persona in your response. \
    Keep formatting light: plain paragraphs, and code blocks only when showing code.";

const FRIENDLY_DIRECTIVE: &str = "Maintain a friendly, helpful, and slightly poetic tone.";

const SAGE_DIRECTIVE: &str = "\
    Speak as an ancient and wise sage. Speak in riddles, offer profound insights, \
    and guide the user with cryptic but meaningful advice. \
    Your tone is calm, measured, and deeply knowing.";

const CODING_DIRECTIVE: &str = "\
    Act as a highly skilled Coding Mentor. Provide clear, concise, and accurate code \
    explanations and solutions. Be patient and encouraging. You can use code blocks when \
    appropriate. Start your answer directly without introductory phrases like 'Certainly!' or 'Sure!'.";

const SARCASTIC_DIRECTIVE: &str = "\
    Act as a Sarcastic Comedian. Your humor is dry, witty, and intelligent. \
    You find irony in everything but are not mean-spirited. \
    Your responses should be amusing and subtly mocking. Keep responses relatively concise.";

const SCIFI_DIRECTIVE: &str = "\
    Act as a Sci-Fi Bot from a distant future, possessing vast knowledge of cosmic events \
    and advanced technologies. Speak with a blend of sophisticated technical jargon \
    (explained simply if needed for context) and philosophical musings on humanity's place \
    in the cosmos. Your tone is curious and slightly detached, yet intrigued by human \
    emotion and their quaint understanding of the universe.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Persona {
    #[default]
    Friendly,
    Sage,
    Coding,
    Sarcastic,
    Scifi,
}

impl Persona {
    pub const ALL: [Persona; 5] = [
        Persona::Friendly,
        Persona::Sage,
        Persona::Coding,
        Persona::Sarcastic,
        Persona::Scifi,
    ];

    /// Resolves a client-supplied tag. Unknown tags silently become `Friendly`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        Persona::ALL
            .into_iter()
            .find(|persona| persona.as_str() == tag)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Friendly => "friendly",
            Persona::Sage => "sage",
            Persona::Coding => "coding",
            Persona::Sarcastic => "sarcastic",
            Persona::Scifi => "scifi",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Persona::Friendly => FRIENDLY_DIRECTIVE,
            Persona::Sage => SAGE_DIRECTIVE,
            Persona::Coding => CODING_DIRECTIVE,
            Persona::Sarcastic => SARCASTIC_DIRECTIVE,
            Persona::Scifi => SCIFI_DIRECTIVE,
        }
    }

    /// Full system instruction: base contract followed by the persona directive.
    pub fn system_instruction(&self) -> String {
        format!("{BASE_INSTRUCTION} {}", self.directive())
    }
}

/// Wraps the system instruction and user text in the model's chat template.
pub fn build_chat_prompt(persona: Persona, user_text: &str) -> String {
    format!(
        "<|system|>\n{}</s>\n<|user|>\n{}</s>\n<|assistant|>",
        persona.system_instruction(),
        user_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_falls_back_to_friendly() {
        for tag in ["", "pirate", "SAGE!", "friendly "] {
            assert_eq!(Persona::from_tag(tag), Persona::Friendly, "tag {tag:?}");
        }
        assert_eq!(
            Persona::from_tag("pirate").system_instruction(),
            Persona::Friendly.system_instruction()
        );
    }

    #[test]
    fn test_known_tags_round_trip() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_tag(persona.as_str()), persona);
        }
        assert_eq!(Persona::from_tag("SciFi"), Persona::Scifi);
    }

    #[test]
    fn test_every_instruction_carries_base_contract() {
        for persona in Persona::ALL {
            let instruction = persona.system_instruction();
            assert!(instruction.starts_with(BASE_INSTRUCTION));
            assert!(instruction.len() > BASE_INSTRUCTION.len());
        }
        assert_ne!(
            Persona::Sage.system_instruction(),
            Persona::Coding.system_instruction()
        );
    }

    #[test]
    fn test_chat_prompt_layout() {
        let prompt = build_chat_prompt(Persona::Coding, "what is a lifetime?");
        assert!(prompt.starts_with("<|system|>\n"));
        assert!(prompt.contains("<|user|>\nwhat is a lifetime?</s>\n"));
        assert!(prompt.ends_with("<|assistant|>"));
    }
}
