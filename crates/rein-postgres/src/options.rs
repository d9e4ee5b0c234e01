use std::time::Duration;

/// Options that control how plans are applied.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// `SET LOCAL lock_timeout` for the migration transaction.
    pub lock_timeout: Option<Duration>,
    /// Skip execution and only log the statements.
    pub dry_run: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Some(Duration::from_secs(5)),
            dry_run: false,
        }
    }
}

impl ApplyOptions {
    pub(crate) fn lock_timeout_statement(&self) -> Option<String> {
        self.lock_timeout
            .map(|timeout| format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis()))
    }
}
