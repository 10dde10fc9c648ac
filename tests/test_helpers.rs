// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、临时表格文件生成等功能
// ==========================================
#![allow(dead_code)]

use bmn_asset_import::config::{ConfigManager, ImportSettings};
use bmn_asset_import::db::{ensure_schema, open_sqlite_connection};
use bmn_asset_import::repository::AssetRepositoryImpl;
use bmn_asset_import::{AssetImporterImpl, ImportApi};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入临时 CSV 文件（保留 .csv 扩展名）
pub fn write_temp_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp csv");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp csv");
    file.flush().expect("Failed to flush temp csv");
    file
}

/// 基于数据库文件创建导入器（配置来自 config_kv）
pub fn create_test_importer(db_path: &str) -> AssetImporterImpl<AssetRepositoryImpl, ConfigManager> {
    let repo = AssetRepositoryImpl::new(db_path).expect("Failed to create AssetRepository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");
    AssetImporterImpl::new(Arc::new(repo), Arc::new(config))
}

/// 基于数据库文件创建 API（使用内存配置）
pub fn create_test_api(
    db_path: &str,
    settings: ImportSettings,
) -> ImportApi<AssetRepositoryImpl, ImportSettings> {
    let repo = AssetRepositoryImpl::new(db_path).expect("Failed to create AssetRepository");
    ImportApi::new(Arc::new(repo), Arc::new(settings))
}

/// 统计 asset 表行数
pub fn count_assets(db_path: &str) -> i64 {
    let conn = open_sqlite_connection(db_path).expect("Failed to open db");
    conn.query_row("SELECT COUNT(*) FROM asset", [], |row| row.get(0))
        .expect("Failed to count assets")
}
