use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use portal_core::CostReport;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::{CloudError, Result};

pub const COST_API_VERSION: &str = "2023-03-01";
pub const COST_WINDOW_DAYS: i64 = 30;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CostConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub management_endpoint: Option<String>,
    pub login_endpoint: Option<String>,
}

/// Client for the Cost Management query API.
///
/// Each query fetches a fresh client-credentials token and asks for the
/// actual cost of the resource group over the trailing 30 days.
#[derive(Clone)]
pub struct CostClient {
    http: Client,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    subscription_id: String,
    resource_group: String,
    management: Url,
    login: Url,
}

impl CostClient {
    pub fn new(config: &CostConfig) -> Result<Self> {
        let management = parse_endpoint(
            config
                .management_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_MANAGEMENT_ENDPOINT),
            "management",
        )?;
        let login = parse_endpoint(
            config
                .login_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_LOGIN_ENDPOINT),
            "login",
        )?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            subscription_id: config.subscription_id.clone(),
            resource_group: config.resource_group.clone(),
            management,
            login,
        })
    }

    pub async fn current_cost(&self) -> Result<CostReport> {
        let token = self.access_token().await?;
        let (from, to) = cost_window(Utc::now());
        let timeframe = format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"));

        let query = CostQuery {
            query_type: "ActualCost",
            timeframe: "Custom",
            time_period: TimePeriod {
                from: from.to_rfc3339_opts(SecondsFormat::Secs, true),
                to: to.to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            dataset: Dataset {
                granularity: "None",
                aggregation: Aggregation {
                    total_cost: AggregationFunction {
                        name: "Cost",
                        function: "Sum",
                    },
                },
            },
        };

        let mut url = self.management.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::Config("management endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                self.resource_group.as_str(),
                "providers",
                "Microsoft.CostManagement",
                "query",
            ]);
        url.query_pairs_mut()
            .append_pair("api-version", COST_API_VERSION);

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CloudError::status("cost query", status, text));
        }

        let body: CostQueryResponse = response.json().await?;
        let Some(row) = body.properties.rows.first() else {
            return Err(CloudError::NoCostData);
        };
        let total_cost = row.first().and_then(value_as_f64).ok_or_else(|| {
            CloudError::UnexpectedResponse("cost row missing a numeric cost column".to_string())
        })?;
        let currency = row
            .get(1)
            .and_then(|value| value.as_str())
            .unwrap_or("USD")
            .to_string();

        log::info!("cost for {}: {total_cost:.2} {currency}", self.resource_group);
        Ok(CostReport {
            total_cost,
            currency,
            timeframe,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut url = self.login.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::Config("login endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([self.tenant_id.as_str(), "oauth2", "v2.0", "token"]);

        let scope = format!("{}/.default", self.management.as_str().trim_end_matches('/'));
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self.http.post(url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CloudError::status("token request", status, text));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

pub fn cost_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - chrono::Duration::days(COST_WINDOW_DAYS), now)
}

fn parse_endpoint(raw: &str, which: &str) -> Result<Url> {
    Url::parse(raw)
        .map_err(|err| CloudError::Config(format!("invalid {which} endpoint {raw}: {err}")))
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CostQuery {
    #[serde(rename = "type")]
    query_type: &'static str,
    timeframe: &'static str,
    time_period: TimePeriod,
    dataset: Dataset,
}

#[derive(Debug, Serialize)]
struct TimePeriod {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct Dataset {
    granularity: &'static str,
    aggregation: Aggregation,
}

#[derive(Debug, Serialize)]
struct Aggregation {
    #[serde(rename = "totalCost")]
    total_cost: AggregationFunction,
}

#[derive(Debug, Serialize)]
struct AggregationFunction {
    name: &'static str,
    function: &'static str,
}

#[derive(Debug, Deserialize)]
struct CostQueryResponse {
    properties: CostQueryProperties,
}

#[derive(Debug, Deserialize)]
struct CostQueryProperties {
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cost_window_spans_the_trailing_thirty_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let (from, to) = cost_window(now);
        assert_eq!(to, now);
        assert_eq!((to - from).num_days(), 30);
        assert_eq!(from.format("%Y-%m-%d").to_string(), "2024-01-31");
    }

    #[test]
    fn query_body_matches_the_wire_shape() {
        let query = CostQuery {
            query_type: "ActualCost",
            timeframe: "Custom",
            time_period: TimePeriod {
                from: "2024-01-31T12:00:00Z".to_string(),
                to: "2024-03-01T12:00:00Z".to_string(),
            },
            dataset: Dataset {
                granularity: "None",
                aggregation: Aggregation {
                    total_cost: AggregationFunction {
                        name: "Cost",
                        function: "Sum",
                    },
                },
            },
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["type"], "ActualCost");
        assert_eq!(value["timeframe"], "Custom");
        assert_eq!(value["timePeriod"]["from"], "2024-01-31T12:00:00Z");
        assert_eq!(value["dataset"]["granularity"], "None");
        assert_eq!(value["dataset"]["aggregation"]["totalCost"]["name"], "Cost");
        assert_eq!(
            value["dataset"]["aggregation"]["totalCost"]["function"],
            "Sum"
        );
    }

    #[test]
    fn cost_cell_accepts_numbers_and_numeric_strings() {
        assert_eq!(value_as_f64(&serde_json::json!(12.5)), Some(12.5));
        assert_eq!(value_as_f64(&serde_json::json!("12.5")), Some(12.5));
        assert_eq!(value_as_f64(&serde_json::json!("twelve")), None);
        assert_eq!(value_as_f64(&serde_json::json!(null)), None);
    }
}
