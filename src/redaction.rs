use once_cell::sync::Lazy;
use regex::Regex;

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(pwd|password|passwd)\s*=\s*([^;\s]+)").expect("valid regex"),
        Regex::new(r#"(?i)\b(api[_-]?key|token|secret)\s*[:=]\s*["']?([A-Za-z0-9_\-\.]{6,})["']?"#)
            .expect("valid regex"),
        Regex::new(r"(?i)(://[^:/@\s]+):([^@\s]+)@").expect("valid regex"),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionResult {
    pub content: String,
    pub redaction_count: usize,
}

/// Masks credentials in driver messages before they are logged or shown.
#[derive(Debug, Default, Clone)]
pub struct Redactor;

impl Redactor {
    pub fn new() -> Self {
        Self
    }

    pub fn redact(&self, input: &str) -> RedactionResult {
        let mut result = input.to_string();
        let mut redaction_count = 0usize;

        for pattern in SECRET_PATTERNS.iter() {
            let matches = pattern.find_iter(&result).count();
            if matches == 0 {
                continue;
            }

            redaction_count += matches;
            result = pattern
                .replace_all(&result, |caps: &regex::Captures<'_>| {
                    let key = caps.get(1).map(|m| m.as_str()).unwrap_or("secret");
                    if key.starts_with("://") {
                        format!("{}:[REDACTED]@", key)
                    } else {
                        format!("{}=[REDACTED]", key)
                    }
                })
                .to_string();
        }

        RedactionResult {
            content: result,
            redaction_count,
        }
    }
}

pub fn redact(input: &str) -> String {
    Redactor::new().redact(input).content
}
