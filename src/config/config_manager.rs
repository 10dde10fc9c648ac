// ==========================================
// BMN 资产台账 - 配置管理器
// ==========================================
// 职责: 导入参数加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)，缺省时回退默认值
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::dq_validator::DEFAULT_SUSPICIOUS_CODE_DIGITS;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{DEFAULT_HEADER_KEYWORDS, DEFAULT_HEADER_SCAN_ROWS};
use crate::importer::row_transformer::DEFAULT_CATEGORY_LABEL;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 默认请求体上限 10 MiB
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const HEADER_SCAN_ROWS: &str = "import.header_scan_rows";
    pub const HEADER_KEYWORDS: &str = "import.header_keywords"; // 逗号分隔
    pub const DEFAULT_CATEGORY: &str = "import.default_category";
    pub const SUSPICIOUS_CODE_DIGITS: &str = "import.suspicious_code_digits";
    pub const MAX_PAYLOAD_BYTES: &str = "import.max_payload_bytes";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 配置（存在则覆盖）
    ///
    /// # 返回
    /// - Err(ConfigValueError): 数值配置无法解析，或请求体上限为 0（不写入）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        validate_config_value(key, value)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取数值配置；格式错误时告警并回退默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> ImportResult<usize> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => Ok(raw.trim().parse::<usize>().unwrap_or_else(|_| {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                default
            })),
        }
    }

    /// 当前生效配置的快照（便于排查与展示）
    pub async fn snapshot(&self) -> ImportResult<ImportSettings> {
        ImportSettings::load(self).await
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_header_scan_rows(&self) -> ImportResult<usize> {
        let rows = self.get_usize_or_default(config_keys::HEADER_SCAN_ROWS, DEFAULT_HEADER_SCAN_ROWS)?;
        Ok(rows.max(1))
    }

    async fn get_header_keywords(&self) -> ImportResult<Vec<String>> {
        let keywords: Vec<String> = self
            .get_config_value(config_keys::HEADER_KEYWORDS)?
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if keywords.is_empty() {
            Ok(default_keywords())
        } else {
            Ok(keywords)
        }
    }

    async fn get_default_category(&self) -> ImportResult<String> {
        Ok(self
            .get_config_value(config_keys::DEFAULT_CATEGORY)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY_LABEL.to_string()))
    }

    async fn get_suspicious_code_digits(&self) -> ImportResult<usize> {
        self.get_usize_or_default(
            config_keys::SUSPICIOUS_CODE_DIGITS,
            DEFAULT_SUSPICIOUS_CODE_DIGITS,
        )
    }

    async fn get_max_payload_bytes(&self) -> ImportResult<usize> {
        let value = self.get_usize_or_default(config_keys::MAX_PAYLOAD_BYTES, DEFAULT_MAX_PAYLOAD_BYTES)?;
        if value == 0 {
            return Err(ImportError::ConfigValueError {
                key: config_keys::MAX_PAYLOAD_BYTES.to_string(),
                value: value.to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        Ok(value)
    }
}

/// 写入前校验数值配置
fn validate_config_value(key: &str, value: &str) -> ImportResult<()> {
    let numeric_keys = [
        config_keys::HEADER_SCAN_ROWS,
        config_keys::SUSPICIOUS_CODE_DIGITS,
        config_keys::MAX_PAYLOAD_BYTES,
    ];
    if !numeric_keys.contains(&key) {
        return Ok(());
    }

    let invalid = |message: String| ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message,
    };
    let parsed = value
        .trim()
        .parse::<usize>()
        .map_err(|e| invalid(e.to_string()))?;
    if key == config_keys::MAX_PAYLOAD_BYTES && parsed == 0 {
        return Err(invalid("必须大于 0".to_string()));
    }
    Ok(())
}

fn default_keywords() -> Vec<String> {
    DEFAULT_HEADER_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

// ==========================================
// ImportSettings - 内存配置
// ==========================================
// 用于测试、dry-run 预览，或作为 ConfigManager 的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub header_scan_rows: usize,
    pub header_keywords: Vec<String>,
    pub default_category: String,
    pub suspicious_code_digits: usize,
    pub max_payload_bytes: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            header_keywords: default_keywords(),
            default_category: DEFAULT_CATEGORY_LABEL.to_string(),
            suspicious_code_digits: DEFAULT_SUSPICIOUS_CODE_DIGITS,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ImportSettings {
    /// 从任意配置源读取全部参数
    ///
    /// 请求体上限只约束批量接口：此处读取失败时告警并回退默认值，
    /// 文件导入与配置展示不受影响（批量接口自行读取并报错）
    pub async fn load<C: ImportConfigReader + ?Sized>(reader: &C) -> ImportResult<Self> {
        let max_payload_bytes = match reader.get_max_payload_bytes().await {
            Ok(limit) => limit,
            Err(e) => {
                tracing::warn!(error = %e, "请求体上限配置无效，快照使用默认值");
                DEFAULT_MAX_PAYLOAD_BYTES
            }
        };

        Ok(Self {
            header_scan_rows: reader.get_header_scan_rows().await?,
            header_keywords: reader.get_header_keywords().await?,
            default_category: reader.get_default_category().await?,
            suspicious_code_digits: reader.get_suspicious_code_digits().await?,
            max_payload_bytes,
        })
    }
}

#[async_trait]
impl ImportConfigReader for ImportSettings {
    async fn get_header_scan_rows(&self) -> ImportResult<usize> {
        Ok(self.header_scan_rows)
    }

    async fn get_header_keywords(&self) -> ImportResult<Vec<String>> {
        Ok(self.header_keywords.clone())
    }

    async fn get_default_category(&self) -> ImportResult<String> {
        Ok(self.default_category.clone())
    }

    async fn get_suspicious_code_digits(&self) -> ImportResult<usize> {
        Ok(self.suspicious_code_digits)
    }

    async fn get_max_payload_bytes(&self) -> ImportResult<usize> {
        Ok(self.max_payload_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let manager = setup_manager();
        let settings = manager.snapshot().await.unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.header_keywords, vec!["nama", "kode", "urut", "nup", "no"]);
    }

    #[tokio::test]
    async fn test_overrides_from_config_kv() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::HEADER_KEYWORDS, " Uraian, KODE ,")
            .unwrap();
        manager
            .set_global_config_value(config_keys::SUSPICIOUS_CODE_DIGITS, "6")
            .unwrap();
        manager
            .set_global_config_value(config_keys::DEFAULT_CATEGORY, "Bangunan")
            .unwrap();

        assert_eq!(
            manager.get_header_keywords().await.unwrap(),
            vec!["uraian", "kode"]
        );
        assert_eq!(manager.get_suspicious_code_digits().await.unwrap(), 6);
        assert_eq!(manager.get_default_category().await.unwrap(), "Bangunan");
    }

    #[tokio::test]
    async fn test_malformed_number_falls_back() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::HEADER_SCAN_ROWS, "banyak")
            .unwrap();
        assert_eq!(
            manager.get_header_scan_rows().await.unwrap(),
            DEFAULT_HEADER_SCAN_ROWS
        );
    }

    #[tokio::test]
    async fn test_invalid_numeric_values_not_written() {
        let manager = setup_manager();

        let err = manager
            .set_global_config_value(config_keys::MAX_PAYLOAD_BYTES, "0")
            .unwrap_err();
        assert!(matches!(err, ImportError::ConfigValueError { .. }));
        let err = manager
            .set_global_config_value(config_keys::SUSPICIOUS_CODE_DIGITS, "empat")
            .unwrap_err();
        assert!(matches!(err, ImportError::ConfigValueError { .. }));

        assert_eq!(manager.get_config_value(config_keys::MAX_PAYLOAD_BYTES).unwrap(), None);
        assert_eq!(manager.snapshot().await.unwrap(), ImportSettings::default());

        // 0 位表示关闭告警，允许写入
        manager
            .set_global_config_value(config_keys::SUSPICIOUS_CODE_DIGITS, "0")
            .unwrap();
        manager
            .set_global_config_value(config_keys::MAX_PAYLOAD_BYTES, " 2048 ")
            .unwrap();
        assert_eq!(manager.get_max_payload_bytes().await.unwrap(), 2048);
    }

    #[tokio::test]
    async fn test_stored_zero_payload_limit_only_fails_limit_lookup() {
        let manager = setup_manager();
        // 绕过校验直接写库（旧版本或手工修改）
        manager
            .conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, '0')",
                params![config_keys::MAX_PAYLOAD_BYTES],
            )
            .unwrap();

        let err = manager.get_max_payload_bytes().await.unwrap_err();
        assert!(matches!(err, ImportError::ConfigValueError { .. }));

        let settings = manager.snapshot().await.unwrap();
        assert_eq!(settings.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }
}
