//! `minijinja` renderer implementation

use std::path::{Path, PathBuf};

use clap::Parser;
use minijinja::{context, path_loader, Environment, ErrorKind, Value};
use tracing::debug;

use crate::domain::communication::views::{RenderError, Renderer};

/// Views configuration
#[derive(Clone, Debug, Parser)]
pub struct ViewsConfig {
    /// The directory views and layouts are loaded from
    #[clap(long, env = "MAIL_TEMPLATES_DIR", default_value = "templates")]
    pub templates_dir: PathBuf,
}

#[derive(Debug)]
enum Source {
    Directory(PathBuf),
    Memory,
}

/// Renders views from a `minijinja` environment.
///
/// HTML escaping follows the view's extension. A layout is rendered with the
/// view's model plus `body`, the already rendered view.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
    source: Source,
}

impl TemplateRenderer {
    /// Creates a renderer loading views lazily from `root`.
    pub fn from_directory(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();

        let mut env = Environment::new();
        env.set_loader(path_loader(&root));

        Self {
            env,
            source: Source::Directory(root),
        }
    }

    /// Creates a renderer from in-memory `(name, source)` pairs.
    pub fn from_sources<I, N, S>(sources: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = Environment::new();

        for (name, source) in sources {
            let name: String = name.into();
            let source: String = source.into();

            env.add_template_owned(name.clone(), source)
                .map_err(|err| RenderError::Fault {
                    view: name,
                    detail: err.to_string(),
                })?;
        }

        Ok(Self {
            env,
            source: Source::Memory,
        })
    }

    fn searched(&self, view: &str) -> Vec<String> {
        match &self.source {
            Source::Directory(root) => vec![root.join(view).display().to_string()],
            Source::Memory => vec![format!("<memory>/{view}")],
        }
    }

    fn fault(view: &str, err: minijinja::Error) -> RenderError {
        RenderError::Fault {
            view: view.to_string(),
            detail: err.to_string(),
        }
    }
}

impl Renderer for TemplateRenderer {
    fn render(
        &self,
        view: &str,
        model: &serde_json::Value,
        layout: Option<&str>,
    ) -> Result<String, RenderError> {
        let template = self.env.get_template(view).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                RenderError::NotFound {
                    view: view.to_string(),
                    searched: self.searched(view),
                }
            } else {
                Self::fault(view, err)
            }
        })?;

        let body = template
            .render(model)
            .map_err(|err| Self::fault(view, err))?;

        let Some(layout) = layout else {
            return Ok(body);
        };

        debug!(view, layout, "wrapping view in layout");

        let wrapper = self
            .env
            .get_template(layout)
            .map_err(|err| Self::fault(layout, err))?;

        wrapper
            .render(context! {
                body => Value::from_safe_string(body),
                ..Value::from_serialize(model)
            })
            .map_err(|err| Self::fault(layout, err))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn renderer() -> Result<TemplateRenderer, RenderError> {
        TemplateRenderer::from_sources([
            ("welcome.txt", "Hi {{ name }} & co"),
            ("welcome.html", "<p>Hi {{ name }}</p>"),
            ("layout.html", "<main>{{ body }}</main><footer>{{ name }}</footer>"),
            ("broken.html", "{% include \"nowhere.html\" %}"),
        ])
    }

    #[test]
    fn test_render_text_is_not_escaped() -> TestResult {
        let rendered = renderer()?.render("welcome.txt", &json!({ "name": "<Ada>" }), None)?;

        assert_eq!(rendered, "Hi <Ada> & co");

        Ok(())
    }

    #[test]
    fn test_render_html_is_escaped() -> TestResult {
        let rendered = renderer()?.render("welcome.html", &json!({ "name": "<Ada>" }), None)?;

        assert_eq!(rendered, "<p>Hi &lt;Ada&gt;</p>");

        Ok(())
    }

    #[test]
    fn test_render_with_layout_wraps_body() -> TestResult {
        let rendered =
            renderer()?.render("welcome.html", &json!({ "name": "Ada" }), Some("layout.html"))?;

        assert_eq!(rendered, "<main><p>Hi Ada</p></main><footer>Ada</footer>");

        Ok(())
    }

    #[test]
    fn test_render_missing_view_is_not_found() -> TestResult {
        let result = renderer()?.render("missing.txt", &json!({}), None);

        assert_eq!(
            result,
            Err(RenderError::NotFound {
                view: "missing.txt".to_string(),
                searched: vec!["<memory>/missing.txt".to_string()],
            })
        );

        Ok(())
    }

    #[test]
    fn test_render_missing_layout_is_a_fault() -> TestResult {
        let result = renderer()?.render("welcome.html", &json!({ "name": "Ada" }), Some("nope"));

        assert!(matches!(result, Err(RenderError::Fault { view, .. }) if view == "nope"));

        Ok(())
    }

    #[test]
    fn test_render_missing_include_is_a_fault() -> TestResult {
        let result = renderer()?.render("broken.html", &json!({}), None);

        assert!(matches!(result, Err(RenderError::Fault { view, .. }) if view == "broken.html"));

        Ok(())
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        let result = TemplateRenderer::from_sources([("bad.html", "{% if %}")]);

        assert!(matches!(result, Err(RenderError::Fault { view, .. }) if view == "bad.html"));
    }

    #[test]
    fn test_render_from_directory() -> TestResult {
        let root = std::env::temp_dir().join(format!("mail-composer-views-{}", std::process::id()));
        fs::create_dir_all(&root)?;
        fs::write(root.join("hello.txt"), "Hello {{ name }}")?;

        let renderer = TemplateRenderer::from_directory(&root);

        let rendered = renderer.render("hello.txt", &json!({ "name": "Ada" }), None)?;
        let missing = renderer.render("hello.html", &json!({}), None);

        fs::remove_dir_all(&root)?;

        assert_eq!(rendered, "Hello Ada");
        assert!(matches!(
            missing,
            Err(RenderError::NotFound { searched, .. })
                if searched == vec![root.join("hello.html").display().to_string()]
        ));

        Ok(())
    }
}
