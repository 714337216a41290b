//! Template rendering boundary.
//!
//! Records are handed to the engine as the single variable `files`. The
//! default engine is minijinja, whose syntax matches Jinja2 closely enough
//! that templates like `{"count": {{ files|length }}}` work unchanged.
//!
//! A template loaded from disk may `include`, `import` or `extend` other
//! templates by name; those are looked up in the template's own directory.

use crate::permissions::PermissionRecord;
use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("{}: cannot read template file", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error rendering template {name}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// A template loaded into memory, named after its file.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub name: String,
    pub source: String,
    /// Directory that included, imported and parent templates resolve against.
    /// `None` means the template cannot reference other templates.
    pub search_dir: Option<PathBuf>,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            search_dir: None,
        }
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Read a template file. The file name becomes the template name and its
    /// parent directory the search directory.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let search_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            name,
            source,
            search_dir: Some(search_dir),
        })
    }
}

/// Abstraction over the templating engine so it can be swapped or mocked.
pub trait TemplateEngine {
    fn render(
        &self,
        template: &TemplateSource,
        records: &[PermissionRecord],
    ) -> Result<String, TemplateError>;
}

/// minijinja-backed engine.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// With `strict_undefined`, any access to an undefined variable or
    /// attribute fails the render instead of producing an empty string.
    pub fn new(strict_undefined: bool) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(if strict_undefined {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        env.set_auto_escape_callback(auto_escape_for);
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(
        &self,
        template: &TemplateSource,
        records: &[PermissionRecord],
    ) -> Result<String, TemplateError> {
        let render_error = |source: minijinja::Error| TemplateError::Render {
            name: template.name.clone(),
            source,
        };
        let ctx = context! { files => records };

        let Some(dir) = &template.search_dir else {
            return self
                .env
                .render_named_str(&template.name, &template.source, ctx)
                .map_err(render_error);
        };

        // The main template is registered under its file name so the
        // auto-escape callback still sees the extension; everything it
        // references comes from the loader.
        let mut env = self.env.clone();
        env.set_loader(minijinja::path_loader(dir.clone()));
        env.add_template_owned(template.name.clone(), template.source.clone())
            .map_err(render_error)?;
        env.get_template(&template.name)
            .and_then(|tpl| tpl.render(ctx))
            .map_err(render_error)
    }
}

/// Only markup templates are escaped; JSON and YAML templates are emitted
/// verbatim and validated afterwards.
fn auto_escape_for(name: &str) -> AutoEscape {
    let name = name.to_ascii_lowercase();
    if name.ends_with(".html") || name.ends_with(".htm") || name.ends_with(".xml") {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}
