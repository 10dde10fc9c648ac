// ==========================================
// BMN 资产台账 - 配置层
// ==========================================
// 职责: 导入参数管理，支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ImportSettings, DEFAULT_MAX_PAYLOAD_BYTES};
pub use import_config_trait::ImportConfigReader;
