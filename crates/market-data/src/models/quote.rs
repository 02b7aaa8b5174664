use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One normalized price observation for a symbol on a market date.
///
/// Providers parse their raw payloads into private response structs and
/// convert them into this type; nothing outside the provider module sees the
/// raw field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    /// Market date of the observation (exchange-local calendar day)
    pub date: NaiveDate,

    /// Closing/current price (required)
    pub close: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// Quote currency
    pub currency: String,

    /// Provider's display name for the instrument, when it reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PriceSample {
    /// Create a new sample with minimal required fields
    pub fn new(date: NaiveDate, close: Decimal, currency: impl Into<String>) -> Self {
        Self {
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
            currency: currency.into(),
            display_name: None,
        }
    }

    /// Attach open/high/low/volume values.
    pub fn with_ohlv(
        mut self,
        open: Option<Decimal>,
        high: Option<Decimal>,
        low: Option<Decimal>,
        volume: Option<Decimal>,
    ) -> Self {
        self.open = open;
        self.high = high;
        self.low = low;
        self.volume = volume;
        self
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sample_new() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let sample = PriceSample::new(date, dec!(38.50), "BRL");
        assert_eq!(sample.close, dec!(38.50));
        assert_eq!(sample.currency, "BRL");
        assert!(sample.open.is_none());
        assert!(sample.display_name.is_none());
    }

    #[test]
    fn test_blank_display_name_is_dropped() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let sample =
            PriceSample::new(date, dec!(1), "BRL").with_display_name(Some("  ".to_string()));
        assert!(sample.display_name.is_none());
    }

    #[test]
    fn test_serializes_camel_case_without_empty_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let sample = PriceSample::new(date, dec!(38.5), "BRL")
            .with_display_name(Some("Petrobras".to_string()));
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["displayName"], "Petrobras");
        assert_eq!(json["date"], "2024-05-10");
        assert!(json.get("open").is_none());
    }
}
