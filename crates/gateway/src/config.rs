// SPDX-License-Identifier: MIT

//! Environment-driven configuration (SPEC_FULL §6.A).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_password: String,
    pub rabbitmq_host: String,
    pub rabbitmq_user: String,
    pub rabbitmq_password: String,
    pub sandbox_port: u16,
    pub long_poll: Duration,
    pub proxy_timeout: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            redis_host: env_or("SESSIOND_REDIS_HOST", "redis-master"),
            redis_password: env_or("SESSIOND_REDIS_PASSWORD", "admin"),
            rabbitmq_host: env_or("SESSIOND_RABBITMQ_HOST", "rabbitmq-service"),
            rabbitmq_user: env_or("SESSIOND_RABBITMQ_USER", "admin"),
            rabbitmq_password: env_or("SESSIOND_RABBITMQ_PASSWORD", "admin"),
            sandbox_port: env_parsed("SESSIOND_SANDBOX_PORT", 80),
            long_poll: Duration::from_secs(env_parsed("SESSIOND_LONG_POLL_SECS", 90)),
            proxy_timeout: Duration::from_secs(env_parsed("SESSIOND_PROXY_TIMEOUT_SECS", 60)),
            bind_addr: env_or("SESSIOND_BIND_ADDR", "0.0.0.0:8080"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
