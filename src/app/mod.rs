//! The per-process value every response borrows.

use crate::config::Config;
use crate::pool::BufferPool;
use crate::render::{FileRenderer, Minifier, Renderer};

/// Settings and shared collaborators, built once at startup.
///
/// The renderer defaults to a [`FileRenderer`] rooted at
/// [`Config::template_root`]; there is no default minifier, so `minify`
/// has no effect until one is installed.
///
/// # Examples
///
/// ```
/// use outflow::app::App;
/// use outflow::config::Config;
/// use outflow::render::BoxError;
///
/// let app = App::new(Config { minify: true, ..Config::default() })
///     .with_minifier(|_: &str, body: &[u8]| -> Result<Vec<u8>, BoxError> {
///         Ok(body.trim_ascii().to_vec())
///     });
/// assert!(app.minifier().is_some());
/// ```
pub struct App {
    config: Config,
    pool: BufferPool,
    renderer: Option<Box<dyn Renderer>>,
    minifier: Option<Box<dyn Minifier>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl App {
    pub fn new(config: Config) -> Self {
        let renderer = FileRenderer::new(config.template_root.clone());
        Self {
            config,
            pool: BufferPool::new(),
            renderer: Some(Box::new(renderer)),
            minifier: None,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    #[must_use]
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self
    }

    #[must_use]
    pub fn with_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.minifier = Some(Box::new(minifier));
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: BufferPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn minifier(&self) -> Option<&dyn Minifier> {
        self.minifier.as_deref()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("renderer", &self.renderer.is_some())
            .field("minifier", &self.minifier.is_some())
            .finish()
    }
}
