use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;

use crate::config::RateLimitSettings;

const FALLBACK_CLIENT: &str = "127.0.0.1";

/// Sliding-window limiter keyed by client and route template.
///
/// Buckets with no hit inside the window are dropped by a sweep that runs at
/// most once per window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    swept_at: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            swept_at: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            Duration::from_secs(u64::from(settings.window_seconds.get())),
            settings.max_requests.get(),
        )
    }

    /// Records a request and reports whether it fits, plus the slots left afterwards.
    pub fn allow(&self, client: &str, route: &str) -> (bool, u32) {
        let bucket_key = format!("{client}:{route}");
        let now = Instant::now();
        let window = self.window;

        let verdict = {
            let mut entry = self.buckets.entry(bucket_key).or_default();
            entry.retain(|instant| now.duration_since(*instant) < window);

            let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
            let remaining = self.max_requests.saturating_sub(used);
            if remaining == 0 {
                (false, 0)
            } else {
                entry.push(now);
                (true, remaining - 1)
            }
        };

        self.sweep(now);
        verdict
    }

    /// Drops idle buckets; skipped while another caller sweeps or the last sweep is recent.
    fn sweep(&self, now: Instant) {
        let Ok(mut swept_at) = self.swept_at.try_lock() else {
            return;
        };
        if now.duration_since(*swept_at) < self.window {
            return;
        }
        *swept_at = now;
        drop(swept_at);

        let window = self.window;
        self.buckets.retain(|_, hits| {
            hits.retain(|instant| now.duration_since(*instant) < window);
            !hits.is_empty()
        });
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}

/// First `x-forwarded-for` hop, then `x-real-ip`, else loopback.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(FALLBACK_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn requests_past_the_ceiling_are_rejected_per_route() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);

        assert_eq!(limiter.allow("10.0.0.1", "/cache/items"), (true, 1));
        assert_eq!(limiter.allow("10.0.0.1", "/cache/items"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.1", "/cache/items"), (false, 0));
        assert!(limiter.allow("10.0.0.1", "/cache/traders").0);
        assert!(limiter.allow("10.0.0.2", "/cache/items").0);
    }

    #[test]
    fn window_expiry_frees_slots() {
        let limiter = RateLimiter::new(Duration::from_millis(20), 1);
        assert!(limiter.allow("a", "/r").0);
        assert!(!limiter.allow("a", "/r").0);
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.allow("a", "/r").0);
    }

    #[test]
    fn idle_buckets_are_swept_after_the_window() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 10);
        for n in 0..1_000 {
            limiter.allow(&format!("10.0.{}.{}", n / 256, n % 256), "/cache/item/{id}");
        }
        assert!(limiter.buckets.len() > 1);

        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.allow("192.0.2.1", "/cache/items").0);

        assert_eq!(limiter.buckets.len(), 1);
        assert!(limiter.buckets.contains_key("192.0.2.1:/cache/items"));
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "127.0.0.1");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        assert_eq!(client_ip(&headers), "192.0.2.7");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 198.51.100.1 , 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "198.51.100.1");
    }
}
