use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that aborts a running compilation between structural events.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Compiler configuration.
///
/// `default_namespaces` are searched, in order, for unprefixed names before
/// any `xmlns="..."` declared on the root element.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub default_namespaces: Vec<String>,
    /// Reject unknown metadata attributes instead of ignoring them with a warning.
    pub strict_metadata: bool,
    pub cancellation: Option<CancellationToken>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_namespaces: Vec::new(),
            strict_metadata: true,
            cancellation: None,
        }
    }
}

impl CompilerConfig {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let config = CompilerConfig { cancellation: Some(token.clone()), ..CompilerConfig::default() };
        assert!(!config.is_cancelled());
        token.cancel();
        assert!(config.is_cancelled());
    }

    #[test]
    fn strict_by_default() {
        assert!(CompilerConfig::default().strict_metadata);
        assert!(!CompilerConfig::default().is_cancelled());
    }
}
