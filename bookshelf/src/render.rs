use anyhow::{Context, Result};
use minijinja::Environment;
use serde_json::Value;

/// Turns a template name and a data context into HTML.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: Value) -> Result<String>;
}

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("list.html", include_str!("templates/list.html")),
    ("form.html", include_str!("templates/form.html")),
    ("view.html", include_str!("templates/view.html")),
];

/// Renderer over the templates compiled into the binary.
///
/// `.html` templates are auto-escaped.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("invalid template {name}"))?;
        }
        Ok(Self { env })
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: Value) -> Result<String> {
        let tmpl = self.env.get_template(template)?;
        tmpl.render(context)
            .with_context(|| format!("failed to render {template}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_links_books_and_next_page() {
        let r = TemplateRenderer::new().unwrap();
        let html = r
            .render(
                "list.html",
                json!({
                    "books": [{"id": "1", "title": "Dune", "author": "Frank Herbert"}],
                    "next_page_token": "1",
                }),
            )
            .unwrap();

        assert!(html.contains(r#"href="/books/1""#));
        assert!(html.contains("Dune"));
        assert!(html.contains("page_token=1"));
    }

    #[test]
    fn values_are_html_escaped() {
        let r = TemplateRenderer::new().unwrap();
        let html = r
            .render("view.html", json!({"book": {"id": "1", "title": "<script>x</script>"}}))
            .unwrap();

        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn form_is_prefilled_for_edit() {
        let r = TemplateRenderer::new().unwrap();
        let html = r
            .render(
                "form.html",
                json!({"action": "Edit", "book": {"id": "4", "title": "Emma"}}),
            )
            .unwrap();

        assert!(html.contains("Edit book"));
        assert!(html.contains(r#"value="Emma""#));
        assert!(html.contains("multipart/form-data"));
    }

    #[test]
    fn unknown_templates_are_errors() {
        let r = TemplateRenderer::new().unwrap();
        assert!(r.render("missing.html", json!({})).is_err());
    }
}
