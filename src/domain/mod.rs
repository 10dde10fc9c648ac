// ==========================================
// BMN 资产台账 - 领域模型层
// ==========================================
// 职责: 定义导入管道的实体与值对象
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod asset;
pub mod types;

// 重导出核心类型
pub use asset::{
    fields, AssetWriteContext, CellValue, FieldValue, HeaderBinding, HeaderMap, ImportOutcome,
    RawRow, RowError, StoredAsset, TransformedAsset, ValidationError, ValidationReport,
    ValidationSummary,
};
pub use types::{AssetCategory, Coordinate, DqLevel, ImportMode};
