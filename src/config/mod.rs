// ==========================================
// HTM Vault - 配置层
// ==========================================
// 职责: 系统配置管理（编号格式、默认排序）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod identity_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use identity_config_trait::{ConfigResult, IdentityConfigReader};
