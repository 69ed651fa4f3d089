use crate::app::error::{FolderError, Result};
use crate::app::models::ProcessContext;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("valid token regex"));

/// Turns a path template into a concrete path.
///
/// The resolver treats implementations as opaque: it never looks at token syntax itself.
pub trait Substitute {
    fn substitute(&self, template: &str) -> Result<String>;
}

impl<F> Substitute for F
where
    F: Fn(&str) -> Result<String>,
{
    fn substitute(&self, template: &str) -> Result<String> {
        self(template)
    }
}

/// Replaces `{name}` tokens with values taken from a process context.
#[derive(Debug, Clone, Default)]
pub struct VariableReplacer {
    values: HashMap<String, String>,
}

impl VariableReplacer {
    pub fn new(values: HashMap<String, String>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { values }
    }

    pub fn from_context(context: &ProcessContext) -> Self {
        let mut values = context.variables.clone();
        values.insert("projectname".into(), context.project.clone());
        values.insert("stepname".into(), context.step.clone());
        values.insert("processtitle".into(), context.process_title.clone());
        if let Some(id) = context.process_id {
            values.insert("processid".into(), id.to_string());
        }
        if let Some(id) = context.step_id {
            values.insert("stepid".into(), id.to_string());
        }
        Self::new(values)
    }
}

impl Substitute for VariableReplacer {
    fn substitute(&self, template: &str) -> Result<String> {
        let mut missing = None;
        let replaced = TOKEN_RE.replace_all(template, |caps: &Captures| {
            let name = caps[1].to_lowercase();
            match self.values.get(&name) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert(caps[1].to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(variable) => Err(FolderError::UnresolvedVariable {
                template: template.to_string(),
                variable,
            }),
            None => Ok(replaced.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ProcessContext {
        let mut variables = HashMap::new();
        variables.insert("processpath".to_string(), "/opt/metadata/42".to_string());
        ProcessContext {
            project: "Archive".into(),
            step: "Quality control".into(),
            process_title: "book_0042".into(),
            process_id: Some(42),
            step_id: None,
            variables,
        }
    }

    #[test]
    fn replaces_context_variables() {
        let replacer = VariableReplacer::from_context(&context());
        let path = replacer
            .substitute("{processpath}/images/{processtitle}_media")
            .unwrap();
        assert_eq!(path, "/opt/metadata/42/images/book_0042_media");
    }

    #[test]
    fn token_names_are_case_insensitive() {
        let replacer = VariableReplacer::from_context(&context());
        assert_eq!(replacer.substitute("/data/{ProcessId}").unwrap(), "/data/42");
    }

    #[test]
    fn template_without_tokens_is_unchanged() {
        let replacer = VariableReplacer::default();
        assert_eq!(replacer.substitute("/srv/static").unwrap(), "/srv/static");
    }

    #[test]
    fn unknown_token_is_a_configuration_error() {
        let replacer = VariableReplacer::from_context(&context());
        match replacer.substitute("{processpath}/{stepid}").unwrap_err() {
            FolderError::UnresolvedVariable { variable, .. } => assert_eq!(variable, "stepid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn closures_act_as_substitutes() {
        let upper = |t: &str| -> Result<String> { Ok(t.to_uppercase()) };
        assert_eq!(upper.substitute("/a/b").unwrap(), "/A/B");
    }
}
