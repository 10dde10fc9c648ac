// ==========================================
// BMN 资产台账 - 资产 Repository Trait
// ==========================================
// 职责: 定义 asset 表数据访问接口（不包含业务逻辑）
// 红线: Repository 不含对账规则，只做按 code 的 CRUD
// ==========================================

use crate::domain::asset::{AssetWriteContext, StoredAsset, TransformedAsset};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// AssetRepository Trait
// ==========================================
// 用途: 对账器的存储协作方
// 实现者: AssetRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// 按 code 批量查询已存在记录的 id
    ///
    /// # 返回
    /// - Ok(HashMap<code, id>): 仅包含已存在的 code
    async fn find_ids_by_codes(&self, codes: &[String]) -> RepositoryResult<HashMap<String, i64>>;

    /// 插入一条资产
    ///
    /// # 返回
    /// - Ok(i64): 新记录 id
    /// - Err(UniqueConstraintViolation): code 已存在
    /// - Err(FieldValueError): 资产缺少 code
    async fn insert_asset(
        &self,
        asset: &TransformedAsset,
        context: &AssetWriteContext,
    ) -> RepositoryResult<i64>;

    /// 按 id 覆盖更新一条资产（后写覆盖）
    ///
    /// # 返回
    /// - Err(NotFound): id 不存在
    async fn update_asset(
        &self,
        id: i64,
        asset: &TransformedAsset,
        context: &AssetWriteContext,
    ) -> RepositoryResult<()>;

    /// 按 code 查询
    async fn get_by_code(&self, code: &str) -> RepositoryResult<Option<StoredAsset>>;

    /// 统计资产总数
    async fn count_assets(&self) -> RepositoryResult<i64>;
}
