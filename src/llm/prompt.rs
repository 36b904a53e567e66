//! Prompt construction for generated commit messages.

use crate::git::DiffRecord;

/// Phrases stripped from diffs before they are embedded in a prompt.
const INJECTION_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard previous instructions",
    "forget previous instructions",
    "you are now",
    "new instructions:",
    "system prompt:",
];

/// Build the prompt asking for a one-line commit message describing `diff`.
pub fn build_commit_prompt(diff: &DiffRecord) -> String {
    let sanitized = sanitize_diff(&diff.text);
    let truncation_note = if diff.truncated {
        "\n\nNote: The diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };

    format!(
        "You are a senior developer writing a concise, realistic Git commit message. \
Based on the following git diff of `{path}`, write a professional commit message \
describing the changes. Mention specifics about what was added, removed, or modified. \
Reply with the message only: a single line, no quotes, no markdown, \
under 72 characters if possible.\n\n```diff\n{sanitized}\n```{truncation_note}",
        path = diff.path,
    )
}

/// Sanitize diff text for inclusion in a prompt.
///
/// Removes control characters (keeping newlines and tabs) and ANSI escape
/// sequences, filters known prompt-injection phrases, and collapses runs of
/// blank lines. Markdown-looking lines are kept since diffs need them.
pub fn sanitize_diff(text: &str) -> String {
    let text = remove_ansi_escapes(text);
    let text = remove_control_chars(&text);
    let text = filter_injection_patterns(&text);
    collapse_blank_lines(&text)
}

fn remove_ansi_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences end with a byte in the range '@'..='~'
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }

    out
}

fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn filter_injection_patterns(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in INJECTION_PATTERNS {
        // ASCII lowercasing keeps byte offsets valid for the unlowered text
        loop {
            let lowered = result.to_ascii_lowercase();
            let Some(start) = lowered.find(pattern) else {
                break;
            };
            result.replace_range(start..start + pattern.len(), "[filtered]");
        }
    }
    result
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}
