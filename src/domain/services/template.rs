//! Template expansion for string config values
//!
//! Values read from template-enabled layers may reference other keys with
//! `{{ key }}`. Expansion is a single pass: substituted text is never
//! scanned again, and references that do not resolve stay literal.

use serde_json::Value;

use crate::domain::value_objects::KeyPath;

pub type Lookup<'a> = dyn Fn(&KeyPath) -> Option<Value> + 'a;

pub trait TemplateExpander: Send + Sync {
    fn expand(&self, template: &str, lookup: &Lookup<'_>) -> String;
}

/// Leaves every string untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl TemplateExpander for NoExpansion {
    fn expand(&self, template: &str, _lookup: &Lookup<'_>) -> String {
        template.to_string()
    }
}

/// `{{ key }}` references, where `key` is any textual key path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceExpander;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

impl TemplateExpander for BraceExpander {
    fn expand(&self, template: &str, lookup: &Lookup<'_>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let reference = &rest[start..start + OPEN.len() + end + CLOSE.len()];
            let replacement = KeyPath::parse(after_open[..end].trim())
                .ok()
                .and_then(|key| lookup(&key))
                .and_then(scalar_text);
            match replacement {
                Some(text) => out.push_str(&text),
                None => out.push_str(reference),
            }
            rest = &after_open[end + CLOSE.len()..];
        }

        out.push_str(rest);
        out
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
