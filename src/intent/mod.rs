//! Intent resolution — transcript in, structured command out.
//!
//! A [`Command`] is what the resolver distills a spoken request into: a
//! command kind the dispatcher knows how to act on, the user's query with
//! the assistant's name stripped, and a short reply to speak back.

pub mod prompt;
pub mod resolver;

pub use prompt::PromptBuilder;
pub use resolver::{ApiResolver, IntentResolver, ResolverError};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// Action categories the assistant understands.
///
/// The wire format is kebab-case (`"google-search"`), matching what the
/// resolver's prompt contract asks the model for.  Anything the model
/// invents outside this set deserializes to [`CommandKind::Unknown`], which
/// is a valid command with no side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    GoogleSearch,
    CalculatorOpen,
    InstagramOpen,
    FacebookOpen,
    WeatherShow,
    YoutubeSearch,
    YoutubePlay,
    GeneralQuery,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One resolved user request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// What to do.
    #[serde(rename = "type")]
    pub kind: CommandKind,

    /// The user's query with the assistant name removed; feeds the
    /// dispatcher's URL templates.
    #[serde(rename = "userInput", default)]
    pub user_input: String,

    /// Short sentence to speak back to the user.
    #[serde(default)]
    pub response: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
