use std::time::Duration;

/// Repository settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Rooms untouched for this long are evicted by the sweep.
    pub idle_timeout: Duration,
    /// How often the background reaper runs.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(2 * 60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = StoreConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(7200));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }
}
