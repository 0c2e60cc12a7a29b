use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Injected key holding the project name.
pub const PROJECT_NAME_KEY: &str = "project_name";
/// Injected key holding the scenario executable path, with forward slashes.
pub const PATH_EXECUTABLE_KEY: &str = "path_executable";
/// Injected key holding the base name of the job output.
pub const OUTPUT_KEY: &str = "output";

/// Keys that are always available to a template, on top of the table columns.
pub const INJECTED_KEYS: [&str; 3] = [PROJECT_NAME_KEY, PATH_EXECUTABLE_KEY, OUTPUT_KEY];

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read job script template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Job script template references '${0}' but no value is provided for it")]
    MissingPlaceholderValue(String),
}

/// Matches `$$`, `$name` and `${name}`.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[A-Za-z_][A-Za-z0-9_]*)|\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\})")
            .expect("placeholder pattern is valid")
    })
}

fn placeholder_name<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.name("named")
        .or_else(|| caps.name("braced"))
        .map(|m| m.as_str())
}

/// A job script template with `$name` style placeholders.
///
/// `$$` renders a literal `$`. A `$` that does not start a placeholder is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    text: String,
}

impl JobTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(text))
    }

    /// Names of all placeholders referenced by the template.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        placeholder_pattern()
            .captures_iter(&self.text)
            .filter_map(|caps| placeholder_name(&caps))
            .collect()
    }

    /// Check that every placeholder is one of `available`, without rendering anything.
    pub fn check_keys<'a>(
        &self,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), TemplateError> {
        let available = available.into_iter().collect::<BTreeSet<_>>();
        match self
            .placeholders()
            .into_iter()
            .find(|name| !available.contains(name))
        {
            Some(missing) => Err(TemplateError::MissingPlaceholderValue(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Substitute every placeholder with its value.
    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.text.len());
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(&self.text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            rendered.push_str(&self.text[last..whole.start()]);

            match placeholder_name(&caps) {
                Some(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingPlaceholderValue(name.to_string()))?;
                    rendered.push_str(value);
                }
                None => rendered.push('$'),
            }

            last = whole.end();
        }
        rendered.push_str(&self.text[last..]);

        Ok(rendered)
    }
}
