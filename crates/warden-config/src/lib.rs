//! 网关配置
//!
//! 聚合池、重试、RS485、监控四段配置，TOML 文件缺省时回落到默认值。

pub mod loader;

use serde::{Deserialize, Serialize};
use warden_monitor::MonitorConfig;
use warden_pipeline::RetryPolicy;
use warden_pool::PoolConfig;
use warden_rs485::Rs485Config;

pub use loader::ConfigLoader;

/// 网关全量配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub pool: PoolConfig,
    pub retry: RetryPolicy,
    pub rs485: Rs485Config,
    pub monitor: MonitorConfig,
}
