//! Attempt-once initialization of the provider host.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::{ProviderError, ProviderHost, ProviderResult, SymbolProvider};

/// Process-scoped provider context.
///
/// Wraps a [`ProviderHost`] and runs its `initialize` routine lazily, the
/// first time a provider is requested. The outcome is memoized: if
/// initialization fails, every later request fails immediately with
/// [`ProviderError::NotInitialized`] and the host is never asked again.
///
/// Create one per debugger process and share it (`Arc`) with every registry.
pub struct ProviderEnvironment
{
    host: Arc<dyn ProviderHost>,
    state: OnceCell<ProviderResult<()>>,
}

impl ProviderEnvironment
{
    pub fn new(host: Arc<dyn ProviderHost>) -> Self
    {
        Self {
            host,
            state: OnceCell::new(),
        }
    }

    /// Initialize the host if that has not been attempted yet.
    ///
    /// ## Errors
    ///
    /// Returns the original failure on the first attempt and
    /// `NotInitialized` on every attempt after a failure.
    pub fn initialize(&self) -> ProviderResult<()>
    {
        let mut first_attempt = false;
        let outcome = self.state.get_or_init(|| {
            first_attempt = true;
            let outcome = self.host.initialize();
            match &outcome {
                Ok(()) => debug!("symbol provider environment initialized"),
                Err(err) => warn!("symbol provider environment failed to initialize: {err}"),
            }
            outcome
        });

        match outcome {
            Ok(()) => Ok(()),
            Err(err) if first_attempt => Err(err.clone()),
            Err(_) => Err(ProviderError::NotInitialized),
        }
    }

    /// Whether initialization has been attempted, successfully or not.
    pub fn attempted(&self) -> bool
    {
        self.state.get().is_some()
    }

    /// Whether initialization has been attempted and succeeded.
    pub fn is_ready(&self) -> bool
    {
        matches!(self.state.get(), Some(Ok(())))
    }

    /// Create a provider for one module, initializing the host on first use.
    pub fn create_provider(&self) -> ProviderResult<Box<dyn SymbolProvider>>
    {
        self.initialize()?;
        self.host.create_provider()
    }
}

impl fmt::Debug for ProviderEnvironment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ProviderEnvironment")
            .field("attempted", &self.attempted())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingHost
    {
        init_calls: AtomicUsize,
        fail: bool,
    }

    impl ProviderHost for CountingHost
    {
        fn initialize(&self) -> ProviderResult<()>
        {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ProviderError::Failed("runtime missing".to_string()))
            } else {
                Ok(())
            }
        }

        fn create_provider(&self) -> ProviderResult<Box<dyn SymbolProvider>>
        {
            Err(ProviderError::Failed("not needed".to_string()))
        }
    }

    #[test]
    fn test_failed_initialization_is_never_retried()
    {
        let host = Arc::new(CountingHost {
            init_calls: AtomicUsize::new(0),
            fail: true,
        });
        let env = ProviderEnvironment::new(host.clone());

        assert_eq!(
            env.initialize(),
            Err(ProviderError::Failed("runtime missing".to_string()))
        );
        assert_eq!(env.initialize(), Err(ProviderError::NotInitialized));
        assert!(env.create_provider().is_err());
        assert_eq!(host.init_calls.load(Ordering::SeqCst), 1);
        assert!(env.attempted());
        assert!(!env.is_ready());
    }

    #[test]
    fn test_successful_initialization_runs_once()
    {
        let host = Arc::new(CountingHost {
            init_calls: AtomicUsize::new(0),
            fail: false,
        });
        let env = ProviderEnvironment::new(host.clone());
        assert!(!env.attempted());

        env.initialize().unwrap();
        env.initialize().unwrap();
        assert_eq!(host.init_calls.load(Ordering::SeqCst), 1);
        assert!(env.is_ready());
    }
}
