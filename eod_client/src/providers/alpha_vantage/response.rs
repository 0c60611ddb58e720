use indexmap::IndexMap;
use serde::Deserialize;

/// One month of the `TIME_SERIES_MONTHLY` series. Alpha Vantage sends every
/// number as a string.
#[derive(Deserialize, Debug)]
pub struct MonthlyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Body of a `function=TIME_SERIES_MONTHLY` call.
///
/// Quota and lookup problems come back with a 200 status and one of the
/// message fields set instead of the series.
#[derive(Deserialize, Debug)]
pub struct MonthlyResponse {
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Monthly Time Series", default)]
    pub monthly_time_series: IndexMap<String, MonthlyBar>,
}
