//! Stats frontend.

use crate::dataplane::models;
use crate::state::{Frontend, Options};

pub const STATS_FRONTEND: &str = "stats";

/// Frontend serving the load balancer's stats page on `*:<port>`.
pub fn generate_stats(opts: &Options, port: u16) -> Frontend {
    Frontend {
        frontend: models::Frontend {
            name: STATS_FRONTEND.to_string(),
            http_use_htx: Some(models::Toggle::Enabled),
            httplog: opts.log_requests,
            stats_options: Some(models::StatsOptions {
                stats_enable: true,
                stats_uri_prefix: Some("/stats".to_string()),
                stats_refresh_delay: Some(10),
            }),
            ..Default::default()
        },
        bind: models::Bind {
            name: format!("{}_bind", STATS_FRONTEND),
            address: "*".to_string(),
            port: Some(i64::from(port)),
        },
        log_target: opts.log_target(),
        ..Default::default()
    }
}
