//! Static checks applied to generated render code before it runs.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::GenUiError;

/// Pattern for the two-argument entry point every template must define.
static ENTRY_POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%-?\s*macro\s+render\s*\(\s*data\s*,\s*on_action\s*\)\s*-?%\}")
        .expect("entry point regex must compile")
});

struct Rule {
    label: &'static str,
    pattern: Regex,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    [
        ("dynamic evaluation (eval)", r"\beval\s*\("),
        ("dynamic evaluation (Function constructor)", r"\bnew\s+Function\b|\bFunction\s*\("),
        ("dynamic evaluation (string timer)", r#"\bset(?:Timeout|Interval)\s*\(\s*['"`]"#),
        ("script tag", r"(?i)<\s*script\b"),
        ("javascript: URL", r"(?i)javascript\s*:"),
        ("inline event handler", r#"(?i)<[^>]*\son[a-z]+\s*="#),
        ("embedded frame", r"(?i)<\s*iframe\b|\bsrcdoc\s*="),
        ("DOM global access", r"(?:^|[^.\w])(?:document|window|globalThis)\s*\.|\binnerHTML\b|\bouterHTML\b"),
        ("storage access", r"\b(?:localStorage|sessionStorage)\b"),
        ("template escape hatch", r"\{%-?\s*(?:import|include|extends|from)\b"),
    ]
    .into_iter()
    .map(|(label, pattern)| Rule {
        label,
        pattern: Regex::new(pattern).expect("safety rule regex must compile"),
    })
    .collect()
});

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => "",
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

/// Static safety policy for generated templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyPolicy;

impl SafetyPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Every rule the code violates, in rule order.
    pub fn violations(&self, code: &str) -> Vec<&'static str> {
        let mut found: Vec<&'static str> = RULES
            .iter()
            .filter(|rule| rule.pattern.is_match(code))
            .map(|rule| rule.label)
            .collect();
        if !ENTRY_POINT_RE.is_match(code) {
            found.push("missing render(data, on_action) entry point");
        }
        found
    }

    /// Reject code with any violation.
    pub fn check(&self, code: &str) -> Result<(), GenUiError> {
        let violations = self.violations(code);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GenUiError::UnsafeCode(violations.join(", ")))
        }
    }
}
