//! Binance Execution Service
//!
//! Places signed MARKET orders (`POST /api/v3/order`) for actionable decisions.
//! Requests are HMAC-SHA256 signed and tagged with a fresh client order id.

use super::common::{describe_failure, is_rate_limited, sign, to_exchange_symbol};
use crate::domain::errors::ExecutionError;
use crate::domain::ports::ExecutionService;
use crate::domain::trading::decision::Decision;
use crate::infrastructure::core::circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitBreakerPolicy,
};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, encode_query};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const RECV_WINDOW_MS: u64 = 5000;

pub struct BinanceExecutionService {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    base_url: String,
    quantity: Decimal,
    circuit_breaker: CircuitBreaker,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAck {
    order_id: i64,
    client_order_id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    executed_qty: Option<String>,
}

impl BinanceExecutionService {
    pub fn new(
        api_key: String,
        api_secret: String,
        base_url: String,
        quantity: Decimal,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            api_key,
            api_secret,
            base_url: base_url.trim_end_matches('/').to_string(),
            quantity,
            circuit_breaker: CircuitBreaker::new(
                "BinanceExecution",
                CircuitBreakerPolicy {
                    failure_threshold: 3,
                    ..Default::default()
                },
            ),
        }
    }

    /// Unsigned order parameters in the order they are signed.
    fn order_params(
        &self,
        decision: Decision,
        symbol: &str,
        client_order_id: &str,
        timestamp_ms: i64,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", to_exchange_symbol(symbol)),
            ("side", decision.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", self.quantity.normalize().to_string()),
            ("newClientOrderId", client_order_id.to_string()),
            ("recvWindow", RECV_WINDOW_MS.to_string()),
            ("timestamp", timestamp_ms.to_string()),
        ]
    }

    async fn place_order(&self, decision: Decision, symbol: &str) -> Result<(), ExecutionError> {
        let client_order_id = uuid::Uuid::new_v4().simple().to_string();
        let params = self.order_params(
            decision,
            symbol,
            &client_order_id,
            chrono::Utc::now().timestamp_millis(),
        );
        let query = encode_query(&params);
        let signature = sign(&self.api_secret, &query);
        let url = format!(
            "{}/api/v3/order?{}&signature={}",
            self.base_url, query, signature
        );

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| ExecutionError::ExecutionFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = describe_failure(status, &body);
            warn!(
                "BinanceExecutionService: {} {} rejected: {}",
                decision, symbol, reason
            );
            return Err(if status.is_client_error() && !is_rate_limited(status) {
                ExecutionError::Rejected {
                    symbol: symbol.to_string(),
                    reason,
                }
            } else {
                ExecutionError::ExecutionFailed { reason }
            });
        }

        let ack: OrderAck = response
            .json()
            .await
            .map_err(|e| ExecutionError::ExecutionFailed {
                reason: format!("order placed but acknowledgement unreadable: {}", e),
            })?;
        info!(
            "BinanceExecutionService: {} {} {} -> order {} ({}) status={} filled={}",
            decision,
            self.quantity,
            symbol,
            ack.order_id,
            ack.client_order_id,
            ack.status.as_deref().unwrap_or("?"),
            ack.executed_qty.as_deref().unwrap_or("?"),
        );
        Ok(())
    }
}

#[async_trait]
impl ExecutionService for BinanceExecutionService {
    async fn execute(&self, decision: Decision, symbol: &str) -> Result<(), ExecutionError> {
        if !decision.is_actionable() {
            return Ok(());
        }

        self.circuit_breaker
            .call(self.place_order(decision, symbol))
            .await
            .map_err(|e| match e {
                CircuitBreakerError::Open(reason) => ExecutionError::CircuitOpen { reason },
                CircuitBreakerError::Inner(inner) => inner,
            })
    }
}
