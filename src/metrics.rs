use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of generation requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("gateway_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("gateway_cache_misses_total", "Total cache misses").unwrap();
    pub static ref CACHE_EVICTIONS: Counter =
        register_counter!("gateway_cache_evictions_total", "Entries evicted to stay under the size cap").unwrap();
    pub static ref UPSTREAM_ERRORS: Counter =
        register_counter!("gateway_upstream_errors_total", "Failed calls to the generation API").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("gateway_cache_size", "Current number of items in cache").unwrap();
}
