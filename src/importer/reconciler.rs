// ==========================================
// BMN 资产台账 - Upsert 对账器
// ==========================================
// 职责: 按自然键 code 把整批资产对账到存储
// 模式: upsert / insert-only / update-only
// 约束: 逐行顺序执行，非事务；单行失败不影响后续行
// 幂等: upsert 模式下重复执行同一批次 → inserted=0, updated=批次大小
// ==========================================

use crate::domain::asset::{AssetWriteContext, ImportOutcome, TransformedAsset};
use crate::domain::types::ImportMode;
use crate::i18n::{t, t_with_args};
use crate::repository::asset_repo::AssetRepository;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 单行处理动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Insert,
    Update(i64),
    Skip,   // update-only 且目标不存在
    Reject, // insert-only 且目标已存在
}

/// 按模式与查找结果决定动作（纯函数）
pub fn decide(mode: ImportMode, existing_id: Option<i64>) -> RowAction {
    match (mode, existing_id) {
        (ImportMode::Upsert, Some(id)) => RowAction::Update(id),
        (ImportMode::Upsert, None) => RowAction::Insert,
        (ImportMode::InsertOnly, Some(_)) => RowAction::Reject,
        (ImportMode::InsertOnly, None) => RowAction::Insert,
        (ImportMode::UpdateOnly, Some(id)) => RowAction::Update(id),
        (ImportMode::UpdateOnly, None) => RowAction::Skip,
    }
}

pub struct UpsertReconciler;

impl UpsertReconciler {
    /// 对账整批资产
    ///
    /// # 参数
    /// - assets: 已通过校验的资产
    /// - mode: 导入模式
    /// - existing_by_code: 已存在记录 code → id；新插入的 code 会写回，
    ///   同批次后续重复行按已存在处理
    /// - store: 存储协作方
    /// - context: 批次元信息（folder_id / source_file）
    ///
    /// # 返回
    /// - ImportOutcome: 每行恰好计入 inserted/updated/skipped/failed 之一
    pub async fn reconcile<S>(
        assets: &[TransformedAsset],
        mode: ImportMode,
        existing_by_code: &mut HashMap<String, i64>,
        store: &S,
        context: &AssetWriteContext,
    ) -> ImportOutcome
    where
        S: AssetRepository + ?Sized,
    {
        let mut outcome = ImportOutcome {
            total: assets.len(),
            ..Default::default()
        };

        for (index, asset) in assets.iter().enumerate() {
            let row = asset.row_number.unwrap_or(index + 1);

            let Some(code) = asset.code() else {
                outcome.record_failure(row, None, t("reconcile.missing_code"));
                continue;
            };

            match decide(mode, existing_by_code.get(&code).copied()) {
                RowAction::Insert => match store.insert_asset(asset, context).await {
                    Ok(id) => {
                        debug!(row_number = row, code = %code, id, "资产已插入");
                        outcome.inserted += 1;
                        existing_by_code.insert(code, id);
                    }
                    Err(e) => {
                        warn!(row_number = row, code = %code, error = %e, "资产插入失败");
                        let message =
                            t_with_args("reconcile.storage_failed", &[("error", e.to_string().as_str())]);
                        outcome.record_failure(row, Some(code), message);
                    }
                },
                RowAction::Update(id) => match store.update_asset(id, asset, context).await {
                    Ok(()) => {
                        debug!(row_number = row, code = %code, id, "资产已更新");
                        outcome.updated += 1;
                    }
                    Err(e) => {
                        warn!(row_number = row, code = %code, error = %e, "资产更新失败");
                        let message =
                            t_with_args("reconcile.storage_failed", &[("error", e.to_string().as_str())]);
                        outcome.record_failure(row, Some(code), message);
                    }
                },
                RowAction::Skip => {
                    debug!(row_number = row, code = %code, "目标不存在，跳过");
                    outcome.skipped += 1;
                }
                RowAction::Reject => {
                    let message = t_with_args("reconcile.already_exists", &[("code", code.as_str())]);
                    outcome.record_failure(row, Some(code), message);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{fields, StoredAsset};
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // 内存存储；可指定某个 code 写入失败
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<i64, TransformedAsset>>,
        fail_code: Option<String>,
    }

    impl MemoryStore {
        fn check(&self, asset: &TransformedAsset) -> RepositoryResult<()> {
            if asset.code() == self.fail_code {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AssetRepository for MemoryStore {
        async fn find_ids_by_codes(
            &self,
            codes: &[String],
        ) -> RepositoryResult<HashMap<String, i64>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter_map(|(id, a)| a.code().filter(|c| codes.contains(c)).map(|c| (c, *id)))
                .collect())
        }

        async fn insert_asset(
            &self,
            asset: &TransformedAsset,
            _context: &AssetWriteContext,
        ) -> RepositoryResult<i64> {
            self.check(asset)?;
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            rows.insert(id, asset.clone());
            Ok(id)
        }

        async fn update_asset(
            &self,
            id: i64,
            asset: &TransformedAsset,
            _context: &AssetWriteContext,
        ) -> RepositoryResult<()> {
            self.check(asset)?;
            self.rows.lock().unwrap().insert(id, asset.clone());
            Ok(())
        }

        async fn get_by_code(&self, _code: &str) -> RepositoryResult<Option<StoredAsset>> {
            Ok(None)
        }

        async fn count_assets(&self) -> RepositoryResult<i64> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }
    }

    fn asset(row: usize, code: &str) -> TransformedAsset {
        let mut asset = TransformedAsset::new(row);
        asset.set_text(fields::CODE, code);
        asset
    }

    fn batch() -> Vec<TransformedAsset> {
        vec![asset(1, "A-1"), asset(2, "A-2"), asset(3, "B")]
    }

    async fn run(
        store: &MemoryStore,
        assets: &[TransformedAsset],
        mode: ImportMode,
    ) -> ImportOutcome {
        let codes: Vec<String> = assets.iter().filter_map(|a| a.code()).collect();
        let mut existing = store.find_ids_by_codes(&codes).await.unwrap();
        UpsertReconciler::reconcile(assets, mode, &mut existing, store, &AssetWriteContext::default())
            .await
    }

    #[test]
    fn test_decide_table() {
        assert_eq!(decide(ImportMode::Upsert, Some(7)), RowAction::Update(7));
        assert_eq!(decide(ImportMode::Upsert, None), RowAction::Insert);
        assert_eq!(decide(ImportMode::InsertOnly, Some(7)), RowAction::Reject);
        assert_eq!(decide(ImportMode::InsertOnly, None), RowAction::Insert);
        assert_eq!(decide(ImportMode::UpdateOnly, Some(7)), RowAction::Update(7));
        assert_eq!(decide(ImportMode::UpdateOnly, None), RowAction::Skip);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::default();

        let first = run(&store, &batch(), ImportMode::Upsert).await;
        assert_eq!((first.inserted, first.updated, first.failed), (3, 0, 0));

        let second = run(&store, &batch(), ImportMode::Upsert).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(store.count_assets().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_insert_only_rejects_existing() {
        let store = MemoryStore::default();
        run(&store, &[asset(1, "A-1")], ImportMode::Upsert).await;

        let outcome = run(&store, &batch(), ImportMode::InsertOnly).await;

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors[0].row, 1);
        assert_eq!(outcome.errors[0].code.as_deref(), Some("A-1"));
    }

    #[tokio::test]
    async fn test_update_only_counts_skipped() {
        let store = MemoryStore::default();
        run(&store, &[asset(1, "B")], ImportMode::Upsert).await;

        let outcome = run(&store, &batch(), ImportMode::UpdateOnly).await;

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.count_assets().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_storage_error_fails_row_and_continues() {
        let store = MemoryStore {
            fail_code: Some("A-2".to_string()),
            ..Default::default()
        };

        let outcome = run(&store, &batch(), ImportMode::Upsert).await;

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors[0].row, 2);
        assert_eq!(
            outcome.inserted + outcome.updated + outcome.skipped + outcome.failed,
            outcome.total
        );
    }

    #[tokio::test]
    async fn test_duplicate_in_batch_resolves_to_update() {
        let store = MemoryStore::default();
        let assets = vec![asset(1, "A"), asset(2, "A")];

        let outcome = run(&store, &assets, ImportMode::Upsert).await;

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(store.count_assets().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_code_fails() {
        let store = MemoryStore::default();
        let outcome = run(&store, &[TransformedAsset::new(5)], ImportMode::Upsert).await;
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors[0].row, 5);
        assert_eq!(outcome.errors[0].code, None);
    }
}
