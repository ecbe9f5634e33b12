//! Pluggable body producers and transforms.
//!
//! [`Renderer`] turns template names plus data into markup, [`Minifier`]
//! shrinks structured text. Neither algorithm lives in this crate; any
//! closure with the right shape can stand in for either.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Error type returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves one or more template names plus a data value to a rendered body.
///
/// Called synchronously from the async write path, so implementations
/// should not block for long.
pub trait Renderer: Send + Sync {
    fn render(&self, data: &serde_json::Value, templates: &[&str]) -> Result<Vec<u8>, BoxError>;
}

impl<F> Renderer for F
where
    F: Fn(&serde_json::Value, &[&str]) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn render(&self, data: &serde_json::Value, templates: &[&str]) -> Result<Vec<u8>, BoxError> {
        self(data, templates)
    }
}

/// Removes non-semantic formatting from a body of the given media type.
pub trait Minifier: Send + Sync {
    fn minify(&self, content_type: &str, body: &[u8]) -> Result<Vec<u8>, BoxError>;
}

impl<F> Minifier for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn minify(&self, content_type: &str, body: &[u8]) -> Result<Vec<u8>, BoxError> {
        self(content_type, body)
    }
}

/// Serves template files from a directory verbatim.
///
/// Each name is resolved under the root and the files are concatenated in
/// the order given. The data value is not interpolated; plug a real engine
/// in through [`Renderer`] for that.
///
/// Files are read with blocking `std::fs` calls on the task that renders.
/// That suits small templates; for large ones, or a runtime that must not
/// block, install a `Renderer` that serves preloaded or cached content.
#[derive(Debug, Clone)]
pub struct FileRenderer {
    root: PathBuf,
}

impl FileRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, BoxError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(format!("template name {name:?} escapes the template root").into());
        }
        Ok(self.root.join(relative))
    }
}

impl Renderer for FileRenderer {
    fn render(&self, _data: &serde_json::Value, templates: &[&str]) -> Result<Vec<u8>, BoxError> {
        if templates.is_empty() {
            return Err("no template named".into());
        }
        let mut out = Vec::new();
        for name in templates {
            let path = self.resolve(name)?;
            let content = std::fs::read(&path)
                .map_err(|e| format!("template {name:?} ({}): {e}", path.display()))?;
            debug!(template = %name, bytes = content.len(), "template loaded");
            out.extend_from_slice(&content);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("outflow-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn concatenates_templates_in_order() {
        let dir = template_dir("concat");
        std::fs::write(dir.join("head.html"), "<head></head>").unwrap();
        std::fs::write(dir.join("body.html"), "<body></body>").unwrap();

        let renderer = FileRenderer::new(&dir);
        let out = renderer
            .render(&json!({}), &["head.html", "body.html"])
            .unwrap();
        assert_eq!(out, b"<head></head><body></body>");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unknown_template_fails() {
        let renderer = FileRenderer::new(template_dir("missing"));
        let err = renderer.render(&json!(null), &["nope.html"]).unwrap_err();
        assert!(err.to_string().contains("nope.html"));
        std::fs::remove_dir_all(renderer.root()).unwrap();
    }

    #[test]
    fn rejects_escaping_names() {
        let renderer = FileRenderer::new("/srv/templates");
        assert!(renderer.render(&json!(null), &["../secret"]).is_err());
        assert!(renderer.render(&json!(null), &["/etc/passwd"]).is_err());
        assert!(renderer.render(&json!(null), &[]).is_err());
    }

    #[test]
    fn closures_are_collaborators() {
        let upper = |_: &str, body: &[u8]| -> Result<Vec<u8>, BoxError> {
            Ok(body.to_ascii_uppercase())
        };
        assert_eq!(upper.minify("text/html", b"<p>").unwrap(), b"<P>");

        let echo = |data: &serde_json::Value, _: &[&str]| -> Result<Vec<u8>, BoxError> {
            Ok(data.to_string().into_bytes())
        };
        assert_eq!(echo.render(&json!({"a": 1}), &["x"]).unwrap(), br#"{"a":1}"#);
    }
}
