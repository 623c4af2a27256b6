use colored::Colorize;
use std::collections::HashSet;

/// Knows which configuration fields gclone reads
pub struct ConfigValidator {
    /// Fully qualified names of recognized fields (`section.key`)
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "clone.origin",
            "clone.tags",
            "clone.depth",
            "clone.recursive",
            "clone.single_branch",
            "clone.identity",
            "output.color",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Returns every unknown field in `content`, sorted.
    ///
    /// Content that is not valid TOML yields no fields; parsing reports that.
    #[must_use]
    pub fn unknown_fields(&self, content: &str) -> Vec<String> {
        let Ok(parsed) = toml::from_str::<toml::Table>(content) else {
            return Vec::new();
        };

        let mut unknown = Vec::new();
        for (section, value) in &parsed {
            match value {
                toml::Value::Table(keys) => {
                    for key in keys.keys() {
                        let full_key = format!("{section}.{key}");
                        if !self.known_fields.contains(full_key.as_str()) {
                            unknown.push(full_key);
                        }
                    }
                }
                _ => unknown.push(section.clone()),
            }
        }
        unknown.sort();
        unknown
    }

    /// Prints a warning for each unknown field in `content`
    pub fn warn_unknown_fields(&self, content: &str) {
        let unknown = self.unknown_fields(content);
        if unknown.is_empty() {
            return;
        }

        eprintln!("{}", "Configuration warnings:".yellow().bold());
        for field in unknown {
            eprintln!("  Unknown configuration field: {}", field.yellow());
        }
        eprintln!();
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
