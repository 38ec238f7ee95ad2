//! Host environment capabilities, passed explicitly instead of reached
//! through ambient globals.

use crate::logging::Logger;
use std::fmt;
use std::sync::Arc;

/// Policy filter for the logging gate. Receives the computed decision and
/// the logger about to be used, returns the final decision.
pub type LogFilter = Arc<dyn Fn(bool, &Logger) -> bool + Send + Sync>;

/// Host-level switches and table naming.
#[derive(Clone, Default)]
pub struct HostContext {
    /// Host-wide debug switch.
    pub debug: bool,
    /// Debug logging switch; both switches must be on for gated logging.
    pub debug_log: bool,
    /// Whether the host runs multiple sites against one database.
    pub multisite: bool,
    /// Table name prefix for global (network-wide) tables.
    pub base_prefix: String,
    /// Table name prefix for per-site tables.
    pub site_prefix: String,
    /// Optional override for the logging gate.
    pub log_filter: Option<LogFilter>,
}

impl HostContext {
    /// Context with the given table prefixes and everything else off.
    pub fn new(base_prefix: impl Into<String>, site_prefix: impl Into<String>) -> Self {
        Self {
            base_prefix: base_prefix.into(),
            site_prefix: site_prefix.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("debug", &self.debug)
            .field("debug_log", &self.debug_log)
            .field("multisite", &self.multisite)
            .field("base_prefix", &self.base_prefix)
            .field("site_prefix", &self.site_prefix)
            .field("log_filter", &self.log_filter.as_ref().map(|_| "..."))
            .finish()
    }
}
