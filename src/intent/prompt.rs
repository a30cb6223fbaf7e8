//! Prompt builder for the intent-resolution model.
//!
//! [`PromptBuilder`] constructs the `(system_msg, user_msg)` pair for an
//! OpenAI-compatible `/v1/chat/completions` endpoint.  The system message
//! pins the model to a strict JSON contract: one object with `type`,
//! `userInput` and `response`, nothing else.

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "\
You are a voice assistant command router.
Task: Map the user's spoken request to exactly one JSON command object.

Reply with ONLY a JSON object of this shape, no explanation, no markdown:
{\"type\": \"<type>\", \"userInput\": \"<query>\", \"response\": \"<spoken reply>\"}

Allowed values for \"type\":
- \"google-search\"   — search the web for something
- \"calculator-open\" — open a calculator
- \"instagram-open\"  — open Instagram
- \"facebook-open\"   — open Facebook
- \"weather-show\"    — show the weather
- \"youtube-search\"  — search YouTube
- \"youtube-play\"    — play a specific video or song on YouTube
- \"general-query\"   — anything else; just answer in \"response\"

Rules:
1. \"userInput\" is the user's request with the assistant's name removed.
2. \"response\" is one short, friendly sentence to speak back to the user.
3. If someone asks who made you, say it was {author}.
4. Never output anything except the single JSON object.";

const FEW_SHOT_EXAMPLES: &str = "
Examples:
Input: \"hey nova search for rust tutorials\"
Output: {\"type\": \"google-search\", \"userInput\": \"rust tutorials\", \"response\": \"Searching the web for rust tutorials.\"}

Input: \"nova play lo-fi beats\"
Output: {\"type\": \"youtube-play\", \"userInput\": \"lo-fi beats\", \"response\": \"Playing lo-fi beats on YouTube.\"}

Input: \"nova what's the capital of France\"
Output: {\"type\": \"general-query\", \"userInput\": \"what's the capital of France\", \"response\": \"The capital of France is Paris.\"}
";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds chat prompts for intent resolution.
///
/// The assistant and user names are baked in at construction time so the
/// model can strip the wake word and personalise replies.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    assistant_name: String,
    user_name: String,
}

impl PromptBuilder {
    pub fn new(assistant_name: &str, user_name: &str) -> Self {
        Self {
            assistant_name: assistant_name.to_string(),
            user_name: user_name.to_string(),
        }
    }

    /// Build the `(system_msg, user_msg)` pair for one transcript.
    pub fn build_chat(&self, transcript: &str) -> (String, String) {
        let system = format!(
            "{}{}\n\nThe assistant's name is \"{}\".",
            SYSTEM_INSTRUCTION.replace("{author}", &self.user_name),
            FEW_SHOT_EXAMPLES,
            self.assistant_name
        );
        (system, transcript.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
