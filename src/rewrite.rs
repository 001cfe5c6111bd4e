//! Window rewrite rules: map `(class, title)` to a display string.
//!
//! Rule keys are regular expressions searched for in a key built from the
//! window, `class<C>` or `class<C> title<T>` when any rule mentions a
//! title.  A class-only rule therefore still matches once titles are part
//! of the key.  The first matching rule by priority wins and its
//! value is formatted with `{class}` and `{title}`.

use log::{error, trace};
use regex::Regex;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;

/// Fallback representation when no rule matches.
pub const DEFAULT_REWRITE: &str = "?";

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    format: String,
    priority: u8,
}

/// Compiled, ordered set of rewrite rules with a per-key result cache.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    rules: Vec<Rule>,
    default: String,
    uses_title: bool,
    cache: RefCell<HashMap<String, String>>,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: DEFAULT_REWRITE.to_string(),
            uses_title: false,
            cache: RefCell::default(),
        }
    }
}

fn priority(key: &str) -> u8 {
    match (key.contains("class"), key.contains("title")) {
        (true, true) => 3,
        (false, true) => 2,
        (true, false) => 1,
        (false, false) => 0,
    }
}

impl RewriteRules {
    /// Compile the `window-rewrite` map.  Invalid regexes and non-string
    /// values are logged and skipped; the remaining rules still apply.
    pub fn new(rules: &Map<String, Value>, default: &str) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        for (key, value) in rules {
            let Some(format) = value.as_str() else {
                error!("window-rewrite value for {key:?} is not a string, skipping");
                continue;
            };
            match Regex::new(key) {
                Ok(pattern) => compiled.push(Rule {
                    pattern,
                    format: format.to_string(),
                    priority: priority(key),
                }),
                Err(e) => error!("invalid window-rewrite regex {key:?}: {e}"),
            }
        }
        // stable: equal priorities keep declaration order
        compiled.sort_by(|a, b| b.priority.cmp(&a.priority));

        let uses_title = rules.keys().any(|k| k.contains("title"));
        Self {
            rules: compiled,
            default: default.to_string(),
            uses_title,
            cache: RefCell::default(),
        }
    }

    /// Whether any rule looks at window titles.
    pub fn uses_title(&self) -> bool {
        self.uses_title
    }

    pub fn key(&self, class: &str, title: &str) -> String {
        if self.uses_title {
            format!("class<{class}> title<{title}>")
        } else {
            format!("class<{class}>")
        }
    }

    pub fn rewrite(&self, class: &str, title: &str) -> String {
        let key = self.key(class, title);
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }

        let format = self
            .rules
            .iter()
            .find(|r| r.pattern.is_match(&key))
            .map_or(self.default.as_str(), |r| r.format.as_str());
        let result = format.replace("{class}", class).replace("{title}", title);
        trace!("rewrite {key} -> {result}");

        self.cache.borrow_mut().insert(key, result.clone());
        result
    }
}
