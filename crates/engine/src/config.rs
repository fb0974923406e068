/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minutes added to the creation time for the delivery estimate on
    /// delivery orders.
    pub estimated_delivery_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            estimated_delivery_minutes: 45,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("ORDER_ESTIMATED_DELIVERY_MINUTES")
            && let Ok(minutes) = value.parse()
        {
            config.estimated_delivery_minutes = minutes;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delivery_estimate_is_45_minutes() {
        assert_eq!(EngineConfig::default().estimated_delivery_minutes, 45);
    }
}
