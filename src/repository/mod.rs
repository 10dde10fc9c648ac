// ==========================================
// BMN 资产台账 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑（对账规则在 importer::reconciler）
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod asset_repo;
pub mod asset_repo_impl;
pub mod error;

// 重导出核心仓储
pub use asset_repo::AssetRepository;
pub use asset_repo_impl::AssetRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
