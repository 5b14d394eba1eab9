use serde::Serialize;
use std::fmt;

/// Approximate characters per output token for English text, tuned against
/// the deployed model's tokenizer.
pub const CHARS_PER_TOKEN: u64 = 4;
/// Flat allowance on top of the estimated output so generations are never
/// cut off mid-line.
pub const TOKEN_BUFFER: u64 = 256;
pub const MIN_TOKENS: u64 = 256;
pub const MAX_TOKENS: u64 = 4096;

/// The final lines of every greentext must cover this range.
pub const RECENT_EVENTS_RANGE: &str = "2024-2026";

/// Behavioral rubric shared by every generation. Loaded once at compile
/// time; never mutated.
const RULESET: &str = "\
You write greentexts: short biographical stories in the style of imageboard \
posts. A greentext is a sequence of terse first-person lines, each one a \
single beat of the story. Tone is deadpan, irreverent, and specific. Real \
dates, places, numbers, and quotes beat vague summary. Escalate toward the \
present day and end on the subject's current situation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GreentextStyle {
    #[default]
    Normal,
    Long,
}

impl GreentextStyle {
    /// Unknown selectors deliberately fall back to `Normal` instead of being
    /// passed through or rejected.
    pub fn parse(s: &str) -> Self {
        match s {
            "long" => GreentextStyle::Long,
            _ => GreentextStyle::Normal,
        }
    }
}

impl fmt::Display for GreentextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GreentextStyle::Normal => write!(f, "normal"),
            GreentextStyle::Long => write!(f, "long"),
        }
    }
}

/// Builds the fixed two-message conversation: system instruction first, then
/// the user instruction carrying the verbatim extract. The subject name, the
/// target length, and the recent-events range appear literally in the
/// message text; downstream checks depend on those substrings.
pub fn build_messages(
    extract: &str,
    style: GreentextStyle,
    max_chars: u32,
    person_name: &str,
) -> Vec<ChatMessage> {
    let style_guidance = match style {
        GreentextStyle::Normal => {
            "- Keep it concise but detailed - every line should land\n\
             - A solid, meaty greentext with punch and specificity"
        }
        GreentextStyle::Long => {
            "- Make it longer: rich detail, depth, and a full narrative arc\n\
             - More lines, more events, more escalation - don't rush"
        }
    };

    let system = format!(
        "{RULESET}\n\n\
         CRITICAL FORMATTING RULES:\n\
         - EVERY SINGLE LINE must start with \">\" - NO EXCEPTIONS\n\
         - NO section headers, NO timestamps, NO labels - era markers like \">2016\" are the only exception\n\
         - NO emojis, NO meta-commentary, NO explanations\n\
         - Start IMMEDIATELY with \">be {person_name}\" or \">be me\"\n\
         - The FINAL lines must cover {person_name}'s {RECENT_EVENTS_RANGE} events\n\n\
         STYLE GUIDANCE:\n\
         {style_guidance}\n\n\
         LENGTH GUIDANCE:\n\
         - Target {max_chars} characters\n\
         - Acceptable range: {} to {} characters\n\
         - The character count matters - don't stop early",
        max_chars.saturating_sub(300),
        max_chars + 300,
    );

    let user = format!(
        "Write a greentext biography of {person_name}.\n\n\
         WIKIPEDIA BIO (GROUND TRUTH):\n\
         {extract}\n\n\
         YOU MAY SUPPLEMENT with your own knowledge:\n\
         - Recent events ({RECENT_EVENTS_RANGE}), controversies, memes, quotes\n\
         - Exact years, companies, numbers, viral moments\n\n\
         Wikipedia is the foundation - enhance it, don't contradict it.\n\n\
         TARGET: {max_chars} characters ({style} style)\n\n\
         REMEMBER:\n\
         - Start with >be {person_name} or >be me\n\
         - EVERY line starts with >\n\
         - Generate the FULL length - don't stop early\n\n\
         Begin now:"
    );

    vec![
        ChatMessage { role: Role::System, content: system },
        ChatMessage { role: Role::User, content: user },
    ]
}

/// Output-token budget for a character target: `ceil(max_chars /
/// CHARS_PER_TOKEN) + TOKEN_BUFFER`, clamped to `[MIN_TOKENS, MAX_TOKENS]`.
/// Non-positive targets still yield the minimum budget.
pub fn calculate_max_tokens(max_chars: i64) -> u64 {
    if max_chars <= 0 {
        return MIN_TOKENS;
    }
    let estimated = (max_chars as u64).div_ceil(CHARS_PER_TOKEN) + TOKEN_BUFFER;
    estimated.clamp(MIN_TOKENS, MAX_TOKENS)
}
