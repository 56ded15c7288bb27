//! 每设备有界连接池
//!
//! 信号量限制 `max_total`，互斥空闲链表做复用，借出时按存活时长校验，
//! 失效连接销毁后透明补建。池注册表是唯一的共享可变结构。

pub mod config;
pub mod error;
pub mod factory;
pub mod manager;
pub mod pool;

pub use config::PoolConfig;
pub use error::{PoolError, Result};
pub use factory::{ConnectionFactory, TransportConnectionFactory};
pub use manager::PoolManager;
pub use pool::DevicePool;
