// ==========================================
// BMN 资产台账 - 表格导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 国有资产 (BMN) 台账批量导入
// 流程: 表格文件 → 表头映射 → 行转换 → 校验 → 按自然键 upsert
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "id");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssetCategory, Coordinate, DqLevel, ImportMode};

// 领域实体
pub use domain::{
    FieldValue, HeaderMap, ImportOutcome, StoredAsset, TransformedAsset, ValidationReport,
};

// 导入器
pub use importer::{AssetImporter, AssetImporterImpl, ImportError, ImportOptions, ImportResult};

// API
pub use api::{ApiError, ApiResult, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BMN Asset Import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
