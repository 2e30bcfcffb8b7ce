pub mod config;
pub mod editing;
pub mod exposure;
pub mod fake_feed;
pub mod feed;
pub mod http_cache;
pub mod http_client;
pub mod lineup;
pub mod lineup_export;
pub mod logging;
pub mod match_fetch;
pub mod matches;
pub mod overrides;
pub mod projection;
pub mod state;
