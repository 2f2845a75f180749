//! Restricted template sandbox.
//!
//! Renders template strings that contain untrusted user content. The
//! environment starts from [`minijinja::Environment::empty`], so no built-in
//! globals, tests, or loaders exist; the only reachable names are the two
//! whitelisted helpers and the `escape`/`upper` filters. Attribute traversal
//! into exposed object graphs goes through [`policy`], and undefined
//! resolution is strict so a blocked access fails the render instead of
//! rendering as an empty string.

pub mod helpers;
pub mod policy;

use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use thiserror::Error;

/// Errors from sandboxed rendering.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The template failed to parse or render. Covers syntax errors, calls
    /// to non-whitelisted names, and blocked attribute access surfacing as
    /// strict undefined.
    #[error("template rendering error: {0}")]
    Render(#[from] minijinja::Error),
}

/// Renders templates under the museum's restricted policy.
///
/// Construction registers the full whitelist; nothing can be added to a
/// built renderer, so every render runs under the same policy.
pub struct SandboxedRenderer {
    env: Environment<'static>,
}

impl SandboxedRenderer {
    /// Build the sandbox environment with the whitelist registered.
    pub fn new() -> Self {
        let mut env = Environment::empty();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Expression output is HTML-escaped; the SSTI lives in the template
        // source, not in context values.
        env.set_auto_escape_callback(|_name| AutoEscape::Html);

        // The whole global namespace.
        env.add_function("museum_meta", helpers::museum_meta);
        env.add_function("curator_note", helpers::curator_note);

        // The whole filter namespace.
        env.add_filter("upper", upper);
        env.add_filter("escape", escape);

        Self { env }
    }

    /// Compile and render a template string with an empty context.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Render`] if the template fails to parse or
    /// render, including any attempt to reach past the whitelist.
    pub fn render(&self, source: &str) -> Result<String, SandboxError> {
        let rendered = self.env.render_str(source, minijinja::context! {})?;
        Ok(rendered)
    }
}

impl Default for SandboxedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitelisted filter: uppercase a string.
fn upper(value: String) -> String {
    value.to_uppercase()
}

/// Whitelisted filter: HTML-escape a string.
///
/// The result is marked safe so auto-escaping does not escape it twice.
fn escape(value: String) -> Value {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Value::from_safe_string(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_markup_renders_verbatim() {
        let renderer = SandboxedRenderer::new();
        let out = renderer
            .render("<h1>Hello, visitor!</h1>")
            .expect("plain markup should render");
        assert_eq!(out, "<h1>Hello, visitor!</h1>");
    }

    #[test]
    fn test_upper_filter() {
        let renderer = SandboxedRenderer::new();
        let out = renderer
            .render("{{ curator_note() | upper }}")
            .expect("render");
        assert!(out.starts_with("WELCOME TO OUR DIGITAL COLLECTION!"));
    }

    #[test]
    fn test_escape_filter_not_double_escaped() {
        let renderer = SandboxedRenderer::new();
        let out = renderer
            .render("{{ museum_meta('name') | escape }}")
            .expect("render");
        assert_eq!(out, "The Template Museum");
    }

    #[test]
    fn test_unknown_function_is_render_error() {
        let renderer = SandboxedRenderer::new();
        let result = renderer.render("{{ range(10) }}");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_filter_is_render_error() {
        let renderer = SandboxedRenderer::new();
        let result = renderer.render("{{ curator_note() | attr('__class__') }}");
        assert!(result.is_err());
    }
}
