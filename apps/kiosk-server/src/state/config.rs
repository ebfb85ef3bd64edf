//! # Configuration State
//!
//! Read-only view of the loaded [`ServerConfig`] plus values derived from
//! it once at startup.

use std::sync::Arc;

use crate::config::ServerConfig;
use kiosk_core::reports::BusinessDay;
use kiosk_core::Money;

#[derive(Debug, Clone)]
pub struct ConfigState {
    config: Arc<ServerConfig>,
    business_day: BusinessDay,
}

impl ConfigState {
    pub fn new(config: ServerConfig) -> Self {
        let business_day = config.business_day();
        ConfigState {
            config: Arc::new(config),
            business_day,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Calendar used for "today" in reports and summaries.
    pub fn business_day(&self) -> &BusinessDay {
        &self.business_day
    }

    pub fn currency_symbol(&self) -> &str {
        &self.config.business.currency_symbol
    }

    /// Formats money with the configured currency symbol.
    pub fn format_currency(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let abs = Money::from_cents(amount.cents().abs());
        format!("{}{}{}", sign, self.currency_symbol(), abs.to_decimal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        let mut config = ServerConfig::default();
        config.business.currency_symbol = "€".to_string();
        let state = ConfigState::new(config);

        assert_eq!(state.format_currency(Money::from_cents(1250)), "€12.50");
        assert_eq!(state.format_currency(Money::from_cents(-99)), "-€0.99");
    }
}
