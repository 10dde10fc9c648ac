// ==========================================
// BMN 资产台账 - 资产 Repository 实现
// ==========================================
// 职责: asset 表的 rusqlite 实现
// 约定: 扁平字段整体存 data_json；code/asset_type/category/name 冗余为列便于查询
// 并发: 单连接 + Mutex 串行化语句；跨导入无锁，后写覆盖
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::asset::{fields, AssetWriteContext, StoredAsset, TransformedAsset};
use crate::repository::asset_repo::AssetRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// SQLite 默认变量上限 999，IN 查询分块
const CODE_LOOKUP_CHUNK: usize = 500;

// ==========================================
// AssetRepositoryImpl
// ==========================================
pub struct AssetRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl AssetRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 持久化前去掉行号，重复导入时 data_json 保持一致
    fn to_data_json(asset: &TransformedAsset) -> RepositoryResult<String> {
        let mut stored = asset.clone();
        stored.row_number = None;
        Ok(serde_json::to_string(&stored)?)
    }

    fn require_code(asset: &TransformedAsset) -> RepositoryResult<String> {
        asset.code().ok_or_else(|| RepositoryError::FieldValueError {
            field: fields::CODE.to_string(),
            message: "code 为空".to_string(),
        })
    }

    fn parse_timestamp(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("时间格式错误: {} ({})", raw, e),
            })
    }
}

#[async_trait]
impl AssetRepository for AssetRepositoryImpl {
    async fn find_ids_by_codes(&self, codes: &[String]) -> RepositoryResult<HashMap<String, i64>> {
        let conn = self.get_conn()?;
        let mut found = HashMap::new();

        for chunk in codes.chunks(CODE_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT code, id FROM asset WHERE code IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (code, id) = row?;
                found.insert(code, id);
            }
        }

        Ok(found)
    }

    async fn insert_asset(
        &self,
        asset: &TransformedAsset,
        context: &AssetWriteContext,
    ) -> RepositoryResult<i64> {
        let code = Self::require_code(asset)?;
        let data_json = Self::to_data_json(asset)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO asset (
                code, asset_type, category, name, folder_id, source_file,
                data_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                code,
                asset.text(fields::ASSET_TYPE),
                asset.text(fields::CATEGORY),
                asset.text(fields::NAME),
                context.folder_id,
                context.source_file,
                data_json,
                now,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn update_asset(
        &self,
        id: i64,
        asset: &TransformedAsset,
        context: &AssetWriteContext,
    ) -> RepositoryResult<()> {
        let data_json = Self::to_data_json(asset)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.get_conn()?;
        // folder_id / source_file 未提供时保留原值
        let affected = conn.execute(
            r#"
            UPDATE asset SET
                asset_type = ?1,
                category = ?2,
                name = ?3,
                folder_id = COALESCE(?4, folder_id),
                source_file = COALESCE(?5, source_file),
                data_json = ?6,
                updated_at = ?7
            WHERE id = ?8
            "#,
            params![
                asset.text(fields::ASSET_TYPE),
                asset.text(fields::CATEGORY),
                asset.text(fields::NAME),
                context.folder_id,
                context.source_file,
                data_json,
                now,
                id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "asset".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> RepositoryResult<Option<StoredAsset>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, code, asset_type, category, name, folder_id, source_file,
                       data_json, created_at, updated_at
                FROM asset
                WHERE code = ?1
                "#,
                params![code],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            code,
            asset_type,
            category,
            name,
            folder_id,
            source_file,
            data_json,
            created_at,
            updated_at,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(StoredAsset {
            id,
            code,
            asset_type,
            category,
            name,
            folder_id,
            source_file,
            data: serde_json::from_str(&data_json)?,
            created_at: Self::parse_timestamp("created_at", &created_at)?,
            updated_at: Self::parse_timestamp("updated_at", &updated_at)?,
        }))
    }

    async fn count_assets(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM asset", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::domain::asset::FieldValue;

    fn setup_repo() -> AssetRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        AssetRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn asset(code: &str, name: &str) -> TransformedAsset {
        let mut asset = TransformedAsset::new(1);
        asset.set_text(fields::CODE, code);
        asset.set_text(fields::NAME, name);
        asset.set_text(fields::ASSET_TYPE, "tanah");
        asset.set(fields::LUAS_TANAH_SELURUHNYA, FieldValue::Number(1500.0));
        asset
    }

    #[tokio::test]
    async fn test_insert_and_get_by_code() {
        let repo = setup_repo();
        let context = AssetWriteContext {
            folder_id: Some("F-1".to_string()),
            source_file: Some("tanah.xlsx".to_string()),
        };

        let id = repo.insert_asset(&asset("T-01-1", "Tanah A"), &context).await.unwrap();
        let stored = repo.get_by_code("T-01-1").await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.name.as_deref(), Some("Tanah A"));
        assert_eq!(stored.asset_type.as_deref(), Some("tanah"));
        assert_eq!(stored.folder_id.as_deref(), Some("F-1"));
        assert_eq!(stored.data.row_number, None);
        assert_eq!(
            stored.data.get(fields::LUAS_TANAH_SELURUHNYA),
            Some(&FieldValue::Number(1500.0))
        );
        assert!(repo.get_by_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let repo = setup_repo();
        let context = AssetWriteContext::default();
        repo.insert_asset(&asset("A", "one"), &context).await.unwrap();

        let err = repo.insert_asset(&asset("A", "two"), &context).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_folder_when_not_provided() {
        let repo = setup_repo();
        let context = AssetWriteContext {
            folder_id: Some("F-1".to_string()),
            source_file: None,
        };
        let id = repo.insert_asset(&asset("A", "one"), &context).await.unwrap();

        repo.update_asset(id, &asset("A", "renamed"), &AssetWriteContext::default())
            .await
            .unwrap();

        let stored = repo.get_by_code("A").await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("renamed"));
        assert_eq!(stored.folder_id.as_deref(), Some("F-1"));

        let err = repo
            .update_asset(9999, &asset("A", "x"), &AssetWriteContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_ids_by_codes() {
        let repo = setup_repo();
        let context = AssetWriteContext::default();
        let id_a = repo.insert_asset(&asset("A", "a"), &context).await.unwrap();
        let id_b = repo.insert_asset(&asset("B", "b"), &context).await.unwrap();

        let codes = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let found = repo.find_ids_by_codes(&codes).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found.get("A"), Some(&id_a));
        assert_eq!(found.get("B"), Some(&id_b));
        assert_eq!(repo.count_assets().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_without_code_rejected() {
        let repo = setup_repo();
        let err = repo
            .insert_asset(&TransformedAsset::new(1), &AssetWriteContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }
}
