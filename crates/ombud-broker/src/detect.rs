//! Hand-off intent detection over message text.
//!
//! Plain case-insensitive substring containment against configured phrase
//! lists. The lists are fuzzy by nature; matching is deliberately not any
//! smarter than containment.

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};

/// Phrase scanners for escalation (generated replies) and resolution
/// (human-agent replies).
pub struct HandoffDetector {
    escalation: AhoCorasick,
    resolution: AhoCorasick,
}

impl HandoffDetector {
    pub fn new(escalation_phrases: &[String], resolution_phrases: &[String]) -> Result<Self> {
        Ok(Self {
            escalation: build_matcher(escalation_phrases)
                .context("failed to build escalation phrase matcher")?,
            resolution: build_matcher(resolution_phrases)
                .context("failed to build resolution phrase matcher")?,
        })
    }

    /// True when a generated reply asks for a hand-off to a human.
    pub fn needs_escalation(&self, reply_text: &str) -> bool {
        self.escalation.is_match(reply_text)
    }

    /// True when a human agent's message hands the conversation back to the
    /// bot. Callers only evaluate this for non-automation agents while the
    /// conversation is with a human.
    pub fn is_resolution_message(&self, agent_text: &str) -> bool {
        self.resolution.is_match(agent_text)
    }
}

fn build_matcher(phrases: &[String]) -> Result<AhoCorasick, aho_corasick::BuildError> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(phrases)
}
