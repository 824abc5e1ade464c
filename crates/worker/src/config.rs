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
    pub namespace: String,
    pub sandbox_image: String,
    pub sandbox_port: i32,
    pub watch_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            redis_host: env_or("SESSIOND_REDIS_HOST", "redis-master"),
            redis_password: env_or("SESSIOND_REDIS_PASSWORD", "admin"),
            rabbitmq_host: env_or("SESSIOND_RABBITMQ_HOST", "rabbitmq-service"),
            rabbitmq_user: env_or("SESSIOND_RABBITMQ_USER", "admin"),
            rabbitmq_password: env_or("SESSIOND_RABBITMQ_PASSWORD", "admin"),
            namespace: env_or("SESSIOND_NAMESPACE", "default"),
            sandbox_image: env_or("SESSIOND_SANDBOX_IMAGE", "httpd:2.4-alpine"),
            sandbox_port: env_parsed("SESSIOND_SANDBOX_PORT", 80),
            watch_timeout: Duration::from_secs(env_parsed("SESSIOND_WATCH_TIMEOUT_SECS", 60)),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
