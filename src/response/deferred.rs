//! Cleanup callbacks that run once the body is out.

/// A scheduled cleanup callback.
pub type DeferredFn<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Callbacks drained after a terminal write, last registered first.
///
/// Whatever is still registered when the registry is dropped runs then, so
/// a response abandoned before any terminal write still cleans up.
#[derive(Default)]
pub struct Deferred<'a> {
    callbacks: Vec<DeferredFn<'a>>,
}

impl<'a> Deferred<'a> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn push(&mut self, f: impl FnOnce() + Send + 'a) {
        self.callbacks.push(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Runs and removes every callback, most recently registered first.
    pub fn run(&mut self) {
        while let Some(f) = self.callbacks.pop() {
            f();
        }
    }
}

impl Drop for Deferred<'_> {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Deferred<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("pending", &self.callbacks.len())
            .finish()
    }
}
