//! Gated, best-effort logging for table operations.

use crate::context::HostContext;
use std::fmt;
use std::sync::Arc;

/// Log sink supplied per operation call.
///
/// Logging never changes an operation's result; a failed or suppressed log
/// entry is simply dropped.
#[derive(Clone, Default)]
pub enum Logger {
    /// Never log.
    Disabled,
    /// Log through `tracing::error!`.
    #[default]
    Default,
    /// Log through a caller-supplied callback.
    Custom(Arc<dyn Fn(&str) + Send + Sync>),
}

impl Logger {
    /// Build a custom logger from a callback.
    pub fn custom(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(callback))
    }

    /// Gate decision: a disabled logger never logs; otherwise both host
    /// debug switches must be on, and the context's log filter (when
    /// installed) gets the final say either way.
    pub fn can_log(&self, ctx: &HostContext) -> bool {
        if matches!(self, Logger::Disabled) {
            return false;
        }

        let allowed = ctx.debug && ctx.debug_log;
        match &ctx.log_filter {
            Some(filter) => filter(allowed, self),
            None => allowed,
        }
    }

    /// Emit a message if the gate permits.
    pub fn log(&self, ctx: &HostContext, message: &str) {
        if !self.can_log(ctx) {
            return;
        }

        match self {
            Logger::Disabled => {}
            Logger::Default => tracing::error!(target: "tablekit", "{message}"),
            Logger::Custom(callback) => callback(message),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logger::Disabled => f.write_str("Logger::Disabled"),
            Logger::Default => f.write_str("Logger::Default"),
            Logger::Custom(_) => f.write_str("Logger::Custom(..)"),
        }
    }
}
