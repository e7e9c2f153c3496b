//! Two-pass template rendering over classified spans.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{RenderError, Result};

use super::scanner::{scan, Span};

/// Renders template documents against a flattened parameter set.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Base directory for resolving relative inclusion paths.
    base_dir: PathBuf,
}

impl TemplateRenderer {
    /// Creates a renderer resolving inclusions relative to `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Renders a document: inclusions first, then variable substitution.
    ///
    /// # Errors
    ///
    /// Returns an error if an inclusion target cannot be read. Unresolved
    /// variables are not an error; their markers pass through verbatim.
    pub fn render(&self, document: &str, variables: &HashMap<String, String>) -> Result<String> {
        let included = self.include_files(document)?;
        Ok(substitute(&included, variables))
    }

    /// Renders a template file and writes the output document.
    ///
    /// Returns the rendered document so callers that need the body (for
    /// upload or deployment) do not have to read it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the template or an inclusion target is missing,
    /// or if the output cannot be written.
    pub fn render_file(
        &self,
        template_path: &Path,
        variables: &HashMap<String, String>,
        output_path: &Path,
    ) -> Result<String> {
        let document = fs::read_to_string(template_path).map_err(|_| {
            RenderError::TemplateNotFound {
                path: template_path.to_path_buf(),
            }
        })?;

        let rendered = self.render(&document, variables)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::OutputFailed {
                path: output_path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        fs::write(output_path, &rendered).map_err(|e| RenderError::OutputFailed {
            path: output_path.to_path_buf(),
            message: e.to_string(),
        })?;

        info!("Rendered template written: {}", output_path.display());
        Ok(rendered)
    }

    /// Resolves every `${file(...)}` marker to its escaped file content.
    ///
    /// Runs strictly before variable substitution; variable markers pass
    /// through this stage untouched, so inclusion syntax is never
    /// misread as a substitution target or vice versa.
    fn include_files(&self, document: &str) -> Result<String> {
        let mut output = String::with_capacity(document.len());

        for span in scan(document) {
            match span {
                Span::Inclusion { path, .. } => {
                    let resolved = self.resolve_include(path);
                    let content =
                        fs::read_to_string(&resolved).map_err(|_| RenderError::IncludeNotFound {
                            path: resolved.clone(),
                        })?;
                    debug!("Included file: {}", resolved.display());
                    output.push_str(&escape_embedded(&content));
                }
                other => output.push_str(other.raw()),
            }
        }

        Ok(output)
    }

    fn resolve_include(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Substitutes `${name}` markers whose name is a flattened parameter key.
///
/// Substitution is exact-match per marker: each marker is an isolated
/// span, so a short parameter name can never match inside a longer one.
/// Markers whose name has no value, and any inclusion-shaped markers
/// still present, are re-emitted verbatim so missing configuration stays
/// visible in the output.
#[must_use]
pub fn substitute(document: &str, variables: &HashMap<String, String>) -> String {
    let mut output = String::with_capacity(document.len());

    for span in scan(document) {
        match span {
            Span::Variable { name, raw } => match variables.get(name) {
                Some(value) => output.push_str(value),
                None => output.push_str(raw),
            },
            other => output.push_str(other.raw()),
        }
    }

    output
}

/// Escapes included content so it can sit inside a quoted scalar in the
/// output document: newlines, tabs, and double quotes become their
/// backslash forms.
fn escape_embedded(content: &str) -> String {
    content
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_known_variables() {
        let out = substitute("Hello ${projectName}", &vars(&[("projectName", "Acme")]));
        assert_eq!(out, "Hello Acme");
    }

    #[test]
    fn test_unresolved_markers_pass_through_verbatim() {
        let out = substitute("value: ${undefinedKey}", &vars(&[("other", "x")]));
        assert_eq!(out, "value: ${undefinedKey}");
    }

    #[test]
    fn test_exact_match_no_substring_bleed() {
        let out = substitute("${ab}-${a}", &vars(&[("a", "X"), ("ab", "Y")]));
        assert_eq!(out, "Y-X");
    }

    #[test]
    fn test_inclusion_with_escaping() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("policy.json"), "{\n\t\"read\": true\n}").expect("write include");

        let renderer = TemplateRenderer::new(dir.path());
        let out = renderer
            .render("Policy: \"${file(policy.json)}\"", &HashMap::new())
            .expect("render");

        assert_eq!(out, "Policy: \"{\\n\\t\\\"read\\\": true\\n}\"");
    }

    #[test]
    fn test_missing_inclusion_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = TemplateRenderer::new(dir.path());

        let result = renderer.render("${file(absent.json)}", &HashMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_parameter_named_like_inclusion_path_does_not_alter_inclusion() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("shared.txt"), "from-file").expect("write include");

        let renderer = TemplateRenderer::new(dir.path());
        // A parameter whose name equals the inclusion path must not win.
        let out = renderer
            .render("${file(shared.txt)}", &vars(&[("shared.txt", "from-param")]))
            .expect("render");

        assert_eq!(out, "from-file");
    }

    #[test]
    fn test_included_content_receives_substitution() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("fragment.yml"), "name-${stage}").expect("write include");

        let renderer = TemplateRenderer::new(dir.path());
        let out = renderer
            .render("${file(fragment.yml)}", &vars(&[("stage", "prod")]))
            .expect("render");

        assert_eq!(out, "name-prod");
    }

    #[test]
    fn test_render_is_idempotent_on_fully_resolved_input() {
        let variables = vars(&[("projectName", "Acme")]);
        let first = substitute("Hello ${projectName}", &variables);
        let second = substitute(&first, &variables);

        assert_eq!(first, second);
    }

    #[test]
    fn test_render_file_writes_output() {
        let dir = TempDir::new().expect("temp dir");
        let template = dir.path().join("template.yml");
        fs::write(&template, "Hello ${projectName}").expect("write template");

        let renderer = TemplateRenderer::new(dir.path());
        let output = dir.path().join("build").join("out.yml");
        let rendered = renderer
            .render_file(&template, &vars(&[("projectName", "Acme")]), &output)
            .expect("render file");

        assert_eq!(rendered, "Hello Acme");
        assert_eq!(fs::read_to_string(&output).expect("read output"), "Hello Acme");
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = TemplateRenderer::new(dir.path());

        let result = renderer.render_file(
            &dir.path().join("absent.yml"),
            &HashMap::new(),
            &dir.path().join("out.yml"),
        );
        assert!(result.is_err());
    }
}
