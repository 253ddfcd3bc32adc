//! Outbound reply rendering.
//!
//! The chat platform renders plain text, so generated markdown is flattened
//! and retrieval citation markers are dropped before a reply is sent. Pure
//! text transform, no failure modes.

use std::sync::OnceLock;

use regex::Regex;

fn citation_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"【[^】]*】").expect("static regex"))
}

fn numeric_citation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d+\]").expect("static regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static regex"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s+").expect("static regex"))
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Converts a raw generated reply into display text for the chat platform.
pub fn clean_reply(raw: &str) -> String {
    let text = citation_span_re().replace_all(raw, "");
    let text = numeric_citation_re().replace_all(&text, "");
    let text = link_re().replace_all(&text, "$1 ($2)");
    let text = heading_re().replace_all(&text, "");
    let text = text.replace("**", "").replace("__", "").replace('`', "");
    let text = blank_run_re().replace_all(&text, "\n\n");
    text.trim().to_string()
}
