//! Symbol mapping, request signing and error translation shared by the Binance adapters.

use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha2::Sha256;

/// `BTC/USDT` -> `BTCUSDT`. Symbols without a slash pass through.
pub fn to_exchange_symbol(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

/// HMAC-SHA256 of `payload`, hex encoded, as Binance expects in `signature=`.
pub fn sign(secret: &str, payload: &str) -> String {
    // HMAC accepts keys of any length, so the error branch is unreachable.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Error payload Binance attaches to 4xx responses.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Pulls a readable reason out of a failed response body.
pub fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => format!("{} (code {}): {}", status, err.code, err.msg),
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, body),
    }
}

/// Binance answers 429 (and 418 once banned) when the request weight is exceeded.
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_symbol_denormalization() {
        assert_eq!(to_exchange_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(to_exchange_symbol("eth/usdt"), "ETHUSDT");
        assert_eq!(to_exchange_symbol("AVAXUSDT"), "AVAXUSDT");
    }

    #[test]
    fn test_signature_matches_binance_documentation() {
        // Example from the Binance REST API docs (SIGNED endpoint security).
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, payload),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_describe_failure() {
        let body = r#"{"code":-1121,"msg":"Invalid symbol."}"#;
        let reason = describe_failure(StatusCode::BAD_REQUEST, body);
        assert!(reason.contains("-1121"));
        assert!(reason.contains("Invalid symbol."));

        assert_eq!(
            describe_failure(StatusCode::BAD_GATEWAY, ""),
            StatusCode::BAD_GATEWAY.to_string()
        );
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_rate_limited(StatusCode::BAD_REQUEST));
    }
}
