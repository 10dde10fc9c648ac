// ==========================================
// BMN 资产台账 - 资产导入器实现
// ==========================================
// 职责: 整合导入流程，从表格文件到 asset 表
// 流程: 解析 → 表头映射 → 行转换 → 校验 → 重复检测 → 对账落库
// 约束: 逐行落库、非事务；重复执行同一文件结果一致
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::asset::{AssetWriteContext, TransformedAsset};
use crate::domain::types::AssetCategory;
use crate::importer::asset_importer_trait::{
    AssetImporter, DqValidator as _, FieldMapper, ImportOptions, ImportReport, PreviewReport,
    RowTransformer as _,
};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as DefaultFieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::reconciler::UpsertReconciler;
use crate::importer::row_transformer::RowTransformer;
use crate::repository::asset_repo::AssetRepository;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// AssetImporterImpl - 资产导入器实现
// ==========================================
pub struct AssetImporterImpl<R, C>
where
    R: AssetRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    asset_repo: Arc<R>,

    // 配置读取器（每次导入重新读取，config_kv 修改即时生效）
    config: Arc<C>,

    // 导入组件
    field_mapper: Box<dyn FieldMapper>,
    conflict_handler: ConflictHandler,
}

impl<R, C> AssetImporterImpl<R, C>
where
    R: AssetRepository,
    C: ImportConfigReader,
{
    /// 创建新的 AssetImporter 实例
    ///
    /// # 参数
    /// - asset_repo: 资产仓储
    /// - config: 配置读取器
    pub fn new(asset_repo: Arc<R>, config: Arc<C>) -> Self {
        Self {
            asset_repo,
            config,
            field_mapper: Box::new(DefaultFieldMapper),
            conflict_handler: ConflictHandler,
        }
    }

    /// 替换表头映射器
    pub fn with_field_mapper(mut self, field_mapper: Box<dyn FieldMapper>) -> Self {
        self.field_mapper = field_mapper;
        self
    }

    /// 解析 + 映射 + 转换 + 校验（不落库）
    async fn run_preview(
        &self,
        file_path: &Path,
        category: AssetCategory,
        settings: &ImportSettings,
    ) -> ImportResult<PreviewReport> {
        // === 步骤 1: 解析文件 ===
        let parser = UniversalFileParser::new(
            settings.header_scan_rows,
            settings.header_keywords.clone(),
        );
        let sheet = parser.parse(file_path)?;

        // === 步骤 2: 表头映射 ===
        let headers = self.field_mapper.build_header_map(&sheet.headers);
        if headers.is_empty() {
            return Err(ImportError::HeaderRowNotFound {
                scanned: settings.header_scan_rows,
            });
        }
        debug!(
            header_row = sheet.header_row + 1,
            mapped_columns = headers.len(),
            "表头映射完成"
        );

        // === 步骤 3: 行转换 ===
        let transformer = RowTransformer::new(settings.default_category.clone());
        let transformed: Vec<TransformedAsset> = sheet
            .rows
            .iter()
            .map(|raw| transformer.transform(raw, &headers, raw.index, category))
            .collect();

        // === 步骤 4: 校验 ===
        let validator = DqValidator::new(settings.suspicious_code_digits);
        let mut validation = validator.validate(transformed);

        // === 步骤 5: 批内重复提示（不排除）===
        let conflicts = self.conflict_handler.conflict_notices(&validation.valid_data);
        if !conflicts.is_empty() {
            warn!(duplicates = conflicts.len(), "批次内存在重复 code，按后写覆盖处理");
        }
        validation.errors.extend(conflicts);

        Ok(PreviewReport {
            source_file: source_file_name(file_path),
            header_row: sheet.header_row + 1,
            headers,
            validation,
        })
    }
}

#[async_trait]
impl<R, C> AssetImporter for AssetImporterImpl<R, C>
where
    R: AssetRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn preview_file(
        &self,
        file_path: &Path,
        category: AssetCategory,
    ) -> ImportResult<PreviewReport> {
        let settings = ImportSettings::load(self.config.as_ref()).await?;
        let report = self.run_preview(file_path, category, &settings).await?;

        info!(
            total = report.validation.summary.total,
            valid = report.validation.summary.valid,
            invalid = report.validation.summary.invalid,
            warnings = report.validation.summary.warnings,
            "预览完成"
        );
        Ok(report)
    }

    #[instrument(skip(self, file_path, options), fields(batch_id = tracing::field::Empty))]
    async fn import_file(
        &self,
        file_path: &Path,
        options: ImportOptions,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(
            batch_id = %batch_id,
            file = %file_path.display(),
            category = %options.category,
            mode = %options.mode,
            "开始导入资产数据"
        );

        let settings = ImportSettings::load(self.config.as_ref()).await?;
        let preview = self
            .run_preview(file_path, options.category, &settings)
            .await?;

        // === 步骤 6: 对账落库 ===
        let codes: Vec<String> = preview
            .validation
            .valid_data
            .iter()
            .filter_map(TransformedAsset::code)
            .collect();
        let mut existing_by_code = self.asset_repo.find_ids_by_codes(&codes).await?;
        debug!(existing = existing_by_code.len(), "已存在记录查询完成");

        let context = AssetWriteContext {
            folder_id: options.folder_id.clone(),
            source_file: Some(preview.source_file.clone()),
        };
        let outcome = UpsertReconciler::reconcile(
            &preview.validation.valid_data,
            options.mode,
            &mut existing_by_code,
            self.asset_repo.as_ref(),
            &context,
        )
        .await;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            total = outcome.total,
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            elapsed_ms,
            "资产导入完成"
        );

        Ok(ImportReport {
            batch_id,
            mode: options.mode,
            preview,
            outcome,
            elapsed_ms,
        })
    }
}

fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::domain::asset::fields;
    use crate::domain::types::{DqLevel, ImportMode};
    use crate::repository::asset_repo_impl::AssetRepositoryImpl;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn setup_importer() -> AssetImporterImpl<AssetRepositoryImpl, ImportSettings> {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let repo = AssetRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)));
        AssetImporterImpl::new(Arc::new(repo), Arc::new(ImportSettings::default()))
    }

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_preview_reports_header_row_and_warnings() {
        let importer = setup_importer();
        let file = write_csv(
            "DAFTAR BARANG MILIK NEGARA\n\
             \n\
             Kode Barang,NUP,Nama Barang\n\
             3171,1,Tanah Kantor\n\
             2010101001,2,Tanah Gudang\n",
        );

        let report = importer
            .preview_file(file.path(), AssetCategory::Tanah)
            .await
            .unwrap();

        assert_eq!(report.header_row, 3);
        assert_eq!(report.validation.summary.total, 2);
        assert_eq!(report.validation.summary.valid, 2);
        assert_eq!(report.validation.summary.warnings, 1);
        assert_eq!(report.validation.errors[0].level, DqLevel::Warning);
        assert_eq!(report.validation.errors[0].row, 1);
    }

    #[tokio::test]
    async fn test_preview_flags_duplicates_without_excluding() {
        let importer = setup_importer();
        let file = write_csv(
            "Kode Barang,NUP,Nama Barang\n\
             2010101001,1,Pertama\n\
             2010101001,1,Kedua\n",
        );

        let report = importer
            .preview_file(file.path(), AssetCategory::Tanah)
            .await
            .unwrap();

        assert_eq!(report.validation.valid_data.len(), 2);
        let conflicts: Vec<_> = report
            .validation
            .errors
            .iter()
            .filter(|e| e.level == DqLevel::Conflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].row, 2);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let importer = setup_importer();
        let file = write_csv(
            "Kode Barang,NUP,Nama Barang,Luas Tanah Seluruhnya\n\
             2010101001,1,Tanah Kantor,\"1.500,00\"\n\
             2010101001,2,Tanah Gudang,200\n",
        );
        let options = ImportOptions::new(AssetCategory::Tanah, ImportMode::Upsert);

        let first = importer.import_file(file.path(), options.clone()).await.unwrap();
        assert_eq!(first.outcome.inserted, 2);
        assert_eq!(first.outcome.updated, 0);

        let second = importer.import_file(file.path(), options).await.unwrap();
        assert_eq!(second.outcome.inserted, 0);
        assert_eq!(second.outcome.updated, 2);
        assert_ne!(first.batch_id, second.batch_id);

        let stored = importer
            .asset_repo
            .get_by_code("2010101001-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.text(fields::LUAS).as_deref(), Some("1500 m2"));
        assert!(stored.source_file.unwrap().ends_with(".csv"));
    }

    // 把单位自定义的 "No Inventaris" 列当作物品代码
    struct InventoryCodeMapper;

    impl FieldMapper for InventoryCodeMapper {
        fn map_column(&self, header: &str) -> String {
            if header.trim().eq_ignore_ascii_case("no inventaris") {
                fields::KODE_BARANG.to_string()
            } else {
                crate::importer::field_mapper::map_column_to_field(header)
            }
        }
    }

    #[tokio::test]
    async fn test_custom_field_mapper_drives_header_map() {
        let file = write_csv("No Inventaris,Nama Barang\nINV-7,Meja Rapat\n");

        let default_report = setup_importer()
            .preview_file(file.path(), AssetCategory::Tanah)
            .await
            .unwrap();
        assert_eq!(
            default_report.headers.field_for("No Inventaris"),
            Some("extra_no_inventaris")
        );
        assert_eq!(
            default_report.validation.valid_data[0].code().as_deref(),
            Some("ROW_1")
        );

        let importer = setup_importer().with_field_mapper(Box::new(InventoryCodeMapper));
        let report = importer
            .preview_file(file.path(), AssetCategory::Tanah)
            .await
            .unwrap();
        assert_eq!(report.headers.field_for("No Inventaris"), Some(fields::KODE_BARANG));
        assert_eq!(report.validation.valid_data[0].code().as_deref(), Some("INV-7"));
        assert_eq!(report.validation.valid_data[0].name().as_deref(), Some("Meja Rapat"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let importer = setup_importer();
        let err = importer
            .preview_file(Path::new("/tidak/ada.csv"), AssetCategory::Tanah)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
