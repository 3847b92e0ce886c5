use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Client with transient-error retries (exponential backoff, 3 attempts).
    ///
    /// `request_timeout` should stay below the loop's fetch timeout so retries
    /// get a chance to run before the cycle gives up.
    pub fn create_client(request_timeout: Duration) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Renders `k=v&k=v`, percent-encoding both sides.
///
/// reqwest-middleware does not expose `.query()`, and signed Binance
/// endpoints need the exact string that was signed anyway.
pub fn encode_query<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends an encoded query to `base_url`.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, encode_query(params))
}

fn percent_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_query() {
        let url = build_url_with_query(
            "https://api.binance.com/api/v3/klines",
            &[("symbol", "BTCUSDT"), ("interval", "1h"), ("limit", "1000")],
        );
        assert_eq!(
            url,
            "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1h&limit=1000"
        );
    }

    #[test]
    fn test_empty_params_leave_url_untouched() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(build_url_with_query("https://x/y", &params), "https://x/y");
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        assert_eq!(encode_query(&[("symbol", "BTC/USDT")]), "symbol=BTC%2FUSDT");
        assert_eq!(encode_query(&[("q", "a b&c")]), "q=a%20b%26c");
        assert_eq!(
            build_url_with_query("https://x/y?a=1", &[("b", "2")]),
            "https://x/y?a=1&b=2"
        );
    }
}
