//! Export options

use crate::schema::CollisionPolicy;

/// Rows kept in memory before older ones are spilled to disk
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Deflate level used for the zip container
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// Options for one export
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Rows held in memory; 0 keeps every row in memory
    pub window_size: usize,
    /// Handling of fields that display-case to the same header
    pub collision_policy: CollisionPolicy,
    /// Deflate level, 0..=9
    pub compression_level: i64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            window_size: DEFAULT_WINDOW_SIZE,
            collision_policy: CollisionPolicy::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ExportOptions {
    pub fn builder() -> ExportOptionsBuilder {
        ExportOptionsBuilder::default()
    }

    /// Read `RECORDSHEET_WINDOW_SIZE` and `RECORDSHEET_COLLISION_POLICY`
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = ExportOptions::default();

        if let Some(size) = lookup("RECORDSHEET_WINDOW_SIZE").and_then(|s| s.trim().parse().ok())
        {
            options.window_size = size;
        }

        if let Some(raw) = lookup("RECORDSHEET_COLLISION_POLICY") {
            match raw.parse::<CollisionPolicy>() {
                Ok(policy) => options.collision_policy = policy,
                Err(e) => tracing::warn!(error = %e, "ignoring RECORDSHEET_COLLISION_POLICY"),
            }
        }

        options
    }
}

/// Builder for [`ExportOptions`]
#[derive(Debug, Default)]
pub struct ExportOptionsBuilder {
    window_size: Option<usize>,
    collision_policy: Option<CollisionPolicy>,
    compression_level: Option<i64>,
}

impl ExportOptionsBuilder {
    /// Set the number of rows kept in memory
    pub fn with_window_size(mut self, rows: usize) -> Self {
        self.window_size = Some(rows);
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = Some(policy);
        self
    }

    /// Set the deflate level (clamped to 0..=9)
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn build(self) -> ExportOptions {
        let defaults = ExportOptions::default();
        ExportOptions {
            window_size: self.window_size.unwrap_or(defaults.window_size),
            collision_policy: self.collision_policy.unwrap_or(defaults.collision_policy),
            compression_level: self
                .compression_level
                .unwrap_or(defaults.compression_level)
                .clamp(0, 9),
        }
    }
}
