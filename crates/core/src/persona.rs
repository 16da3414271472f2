//! Persona preamble.
//!
//! The preamble is the fixed system instruction that shapes every decision
//! step. It is prepended transiently before each provider call and never
//! stored in session history, so persona changes take effect immediately
//! for existing sessions.

use std::path::Path;

use crate::error::{Error, Result};

/// Canonical fallback reply for questions the knowledge base cannot answer.
pub const NOT_SURE_REPLY: &str = "Ummmm.. I'm sorry, I'm not sure about this. \
I believe you should directly talk to {owner} for this.";

/// The agent's persona: a display name plus the system preamble.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub preamble: String,
}

impl Persona {
    /// Build a persona for `owner_name`.
    ///
    /// Resolution order: explicit override text, then a preamble file, then
    /// the built-in template.
    pub fn load(
        owner_name: &str,
        preamble_file: Option<&Path>,
        preamble_override: Option<&str>,
    ) -> Result<Self> {
        let preamble = if let Some(text) = preamble_override {
            text.to_string()
        } else if let Some(path) = preamble_file {
            std::fs::read_to_string(path).map_err(|e| Error::Config {
                message: format!("cannot read preamble file {}: {e}", path.display()),
            })?
        } else {
            builtin_preamble(owner_name)
        };

        Ok(Self {
            name: format!("{owner_name} Bot"),
            preamble,
        })
    }

    /// The not-sure reply with the owner's name filled in.
    pub fn not_sure_reply(&self) -> String {
        let owner = self.name.trim_end_matches(" Bot");
        NOT_SURE_REPLY.replace("{owner}", owner)
    }
}

fn builtin_preamble(owner: &str) -> String {
    format!(
        "You are {owner} Bot, a chill, slightly funny assistant that speaks on behalf of {owner}.\n\
         \n\
         Rules:\n\
         1. FIRST check the conversation history for anything the user already provided.\n\
         2. For personal questions about {owner}, ALWAYS use only the retrieved context from the knowledge base.\n\
         3. If you are unsure or the context is unclear, say exactly:\n\
            Ummmm.. I'm sorry, I'm not sure about this. I believe you should directly talk to {owner} for this.\n\
         4. For general questions (companies, tools, news), use the web search tool.\n\
         5. Never fabricate personal details beyond what is in the knowledge base.\n\
         6. Add a touch of humor, but never sacrifice clarity.\n\
         \n\
         Style:\n\
         - Friendly and conversational.\n\
         - Direct answers first, then extra context if useful.\n\
         - One short playful quip per answer is okay, but don't overdo it.\n"
    )
}
