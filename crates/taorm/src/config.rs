use tracing::Level;

/// Configuration shared by a [`Taos`](crate::Taos) handle and every query
/// derived from it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Log the assembled SQL and its raw parameter list instead of the
    /// inlined statement.
    pub show_params: bool,
    /// Treat a placeholder/argument mismatch in a condition as an error
    /// instead of silently dropping the condition.
    pub strict_conditions: bool,
    /// Tracing event level for executed SQL.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            show_params: false,
            strict_conditions: false,
            log_level: Level::DEBUG,
            max_sql_length: Some(1024),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log raw SQL plus parameters.
    pub fn show_params(mut self, enabled: bool) -> Self {
        self.show_params = enabled;
        self
    }

    /// Reject conditions whose placeholder count does not match their arguments.
    pub fn strict_conditions(mut self, enabled: bool) -> Self {
        self.strict_conditions = enabled;
        self
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
