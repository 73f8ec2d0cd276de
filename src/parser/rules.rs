use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::vocab::*;

static DIALOGUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[name="([^"]+)"(?:,.*?)?\]\s*(.*)$"#).unwrap());
static KEY_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^[a-z0-9_]+:\s*[a-z0-9_"'\[]"#).unwrap());

/// Outcome for a single trimmed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Discard,
    Keep(String),
    KeepAsDialogue { speaker: String, text: String },
}

impl Verdict {
    /// Transcript form of a kept line.
    pub fn into_line(self) -> Option<String> {
        match self {
            Verdict::Discard => None,
            Verdict::Keep(text) => Some(text),
            Verdict::KeepAsDialogue { speaker, text } => Some(format!("{} : {}", speaker, text)),
        }
    }
}

/// A named discard predicate.
pub struct Rule {
    pub name: &'static str,
    pub discards: fn(&str) -> bool,
}

/// Per-page scan state. `in_script` latches once the script body is confirmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanState {
    pub in_script: bool,
}

/// Rules checked before dialogue extraction, first match wins.
pub static SYNTAX_RULES: &[Rule] = &[
    Rule { name: "too_long", discards: is_too_long },
    Rule { name: "markup", discards: is_markup },
    Rule { name: "code", discards: is_code },
    Rule { name: "url", discards: has_url },
    Rule { name: "script_command", discards: is_script_command },
    Rule { name: "key_value", discards: is_key_value },
    Rule { name: "comment", discards: is_comment },
    Rule { name: "boilerplate", discards: is_boilerplate },
];

/// Rules checked after dialogue extraction, first match wins.
pub static RESIDUE_RULES: &[Rule] = &[
    Rule { name: "bracket_command", discards: is_bracket_command },
    Rule { name: "noise", discards: is_noise },
    Rule { name: "excluded_token", discards: has_excluded_token },
    Rule { name: "language", discards: fails_language_check },
];

/// Classify one trimmed, non-empty line. A successful dialogue match latches
/// `state.in_script` for the rest of the page.
pub fn classify_line(line: &str, state: &mut ScanState) -> Verdict {
    if let Some(rule) = first_match(SYNTAX_RULES, line) {
        trace!(rule = rule.name, line, "discard");
        return Verdict::Discard;
    }

    if let Some((speaker, text)) = match_dialogue(line) {
        if text.is_empty() {
            return Verdict::Discard;
        }
        state.in_script = true;
        return Verdict::KeepAsDialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
        };
    }

    if let Some(rule) = first_match(RESIDUE_RULES, line) {
        trace!(rule = rule.name, line, "discard");
        return Verdict::Discard;
    }

    if !state.in_script {
        trace!(line, "discard before script body");
        return Verdict::Discard;
    }

    Verdict::Keep(line.to_string())
}

fn first_match<'a>(rules: &'a [Rule], line: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| (rule.discards)(line))
}

/// `[name="Speaker",...]Text` → (speaker, text). Text may be empty.
pub fn match_dialogue(line: &str) -> Option<(&str, &str)> {
    let caps = DIALOGUE_RE.captures(line)?;
    let speaker = caps.get(1)?.as_str();
    let text = caps.get(2).map_or("", |m| m.as_str());
    Some((speaker, text))
}

fn is_too_long(line: &str) -> bool {
    line.chars().count() > MAX_LINE_CHARS
}

fn is_markup(line: &str) -> bool {
    line.starts_with(MARKUP_PREFIXES)
}

fn is_code(line: &str) -> bool {
    CODE_SIGNATURES.iter().any(|sig| line.contains(sig))
        || line.ends_with(STATEMENT_TERMINATOR)
        || line.contains(ASSIGNMENT)
}

fn has_url(line: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| line.contains(scheme))
}

fn is_script_command(line: &str) -> bool {
    SCRIPT_COMMANDS.iter().any(|cmd| {
        line.strip_prefix(cmd)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

fn is_key_value(line: &str) -> bool {
    KEY_VALUE_RE.is_match(line) || METADATA_KEYS.iter().any(|key| line.contains(key))
}

fn is_comment(line: &str) -> bool {
    COMMENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE_SUBSTRINGS.iter().any(|s| line.contains(s)) || BOILERPLATE_LINES.contains(&line)
}

fn is_bracket_command(line: &str) -> bool {
    line.starts_with('[')
}

fn is_noise(line: &str) -> bool {
    NOISE_PHRASES.iter().any(|phrase| line.contains(phrase))
}

fn has_excluded_token(line: &str) -> bool {
    EXCLUDED_TOKENS.iter().any(|token| line.contains(token))
}

/// CJK lines must read as a sentence or as dialogue; other-script lines must
/// be free of code symbols and colons. Punctuation-only lines pass.
fn fails_language_check(line: &str) -> bool {
    if has_cjk(line) {
        let is_dialogue = DIALOGUE_SEPARATORS.iter().any(|sep| line.contains(sep));
        let ends_sentence = line.ends_with(TERMINAL_PUNCTUATION);
        let opens_quote = line.starts_with(OPENING_MARKS);
        return !(is_dialogue || ends_sentence || opens_quote);
    }
    if is_punctuation_only(line) {
        return false;
    }
    line.contains(CODE_SYMBOLS) || line.contains(':')
}

pub fn has_cjk(line: &str) -> bool {
    line.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

fn is_punctuation_only(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_whitespace() || PUNCTUATION_ONLY.contains(&c))
}
