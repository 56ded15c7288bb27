use anyhow::{anyhow, Result};
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::GatewayConfig;

/// 配置加载器
///
/// 从目录下的 `gateway.toml` 读取，文件不存在时使用默认配置。
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// 加载网关配置
    pub fn load(&self) -> Result<GatewayConfig> {
        let config_path = self.config_dir.join("gateway.toml");

        if !config_path.exists() {
            info!(path = %config_path.display(), "gateway config not found, using defaults");
            return Ok(GatewayConfig::default());
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        let loaded: GatewayConfig = config.try_deserialize()?;
        Self::validate(&loaded)?;
        Ok(loaded)
    }

    /// 校验各段取值的内部一致性
    pub fn validate(config: &GatewayConfig) -> Result<()> {
        if config.pool.max_total == 0 {
            return Err(anyhow!("pool.max_total must be greater than 0"));
        }
        if config.pool.max_idle > config.pool.max_total {
            return Err(anyhow!(
                "pool.max_idle ({}) cannot be greater than pool.max_total ({})",
                config.pool.max_idle,
                config.pool.max_total
            ));
        }
        if config.pool.min_idle > config.pool.max_idle {
            return Err(anyhow!(
                "pool.min_idle ({}) cannot be greater than pool.max_idle ({})",
                config.pool.min_idle,
                config.pool.max_idle
            ));
        }
        if config.rs485.max_consecutive_timeouts == 0 {
            return Err(anyhow!("rs485.max_consecutive_timeouts must be greater than 0"));
        }
        if config.monitor.history_capacity == 0 {
            return Err(anyhow!("monitor.history_capacity must be greater than 0"));
        }
        if config.monitor.problematic_threshold > config.monitor.recent_window {
            return Err(anyhow!(
                "monitor.problematic_threshold ({}) cannot exceed monitor.recent_window ({})",
                config.monitor.problematic_threshold,
                config.monitor.recent_window
            ));
        }
        Ok(())
    }
}
