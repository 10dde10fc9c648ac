// ==========================================
// BMN 资产台账 - 资产导入 API
// ==========================================
// 职责: 封装文件导入 / 预览 / 模板下载 / 批量 upsert 接口
// 批量 upsert 契约:
//   请求 {assets, mode, folder_id?, source_file?}
//   响应 {total, inserted, updated, skipped, failed, errors}
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::asset::{AssetWriteContext, RowError, TransformedAsset};
use crate::domain::types::{AssetCategory, ImportMode};
use crate::i18n::t_with_args;
use crate::importer::asset_importer_trait::{
    AssetImporter, ImportOptions, ImportReport, PreviewReport,
};
use crate::importer::template::{template_file_name, write_template_csv};
use crate::importer::{AssetImporterImpl, UpsertReconciler};
use crate::repository::{AssetRepository, AssetRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// 批量 upsert 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpsertRequest {
    pub assets: Vec<TransformedAsset>,
    #[serde(default)]
    pub mode: ImportMode,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
}

/// 批量 upsert 响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpsertResponse {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

/// 模板下载响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    pub file_name: String,
    pub content: String,
}

/// 资产导入 API
pub struct ImportApi<R, C>
where
    R: AssetRepository,
    C: ImportConfigReader,
{
    asset_repo: Arc<R>,
    config: Arc<C>,
    importer: AssetImporterImpl<R, C>,
}

impl ImportApi<AssetRepositoryImpl, ConfigManager> {
    /// 基于数据库文件创建 ImportApi（仓储与配置共用同一路径）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let asset_repo = AssetRepositoryImpl::new(db_path)?;
        let config = ConfigManager::new(db_path)?;
        Ok(Self::new(Arc::new(asset_repo), Arc::new(config)))
    }
}

impl<R, C> ImportApi<R, C>
where
    R: AssetRepository,
    C: ImportConfigReader,
{
    /// 创建新的 ImportApi 实例
    pub fn new(asset_repo: Arc<R>, config: Arc<C>) -> Self {
        let importer = AssetImporterImpl::new(asset_repo.clone(), config.clone());
        Self {
            asset_repo,
            config,
            importer,
        }
    }

    /// 批量 upsert 已转换的资产
    ///
    /// # 参数
    /// - body: 原始 JSON 请求体
    ///
    /// # 返回
    /// - Ok(BulkUpsertResponse): 逐行对账结果
    /// - Err(PayloadTooLarge): 请求体超过配置上限
    /// - Err(MalformedPayload): JSON 无法解析
    pub async fn bulk_upsert(&self, body: &str) -> ApiResult<BulkUpsertResponse> {
        let limit = self.config.get_max_payload_bytes().await?;
        if body.len() > limit {
            warn!(size = body.len(), limit, "批量请求体过大");
            return Err(ApiError::PayloadTooLarge {
                size: body.len(),
                limit,
            });
        }

        let request: BulkUpsertRequest = serde_json::from_str(body)
            .map_err(|e| ApiError::MalformedPayload(e.to_string()))?;

        self.upsert_assets(request).await
    }

    /// 批量 upsert（已反序列化的请求）
    pub async fn upsert_assets(&self, request: BulkUpsertRequest) -> ApiResult<BulkUpsertResponse> {
        let codes: Vec<String> = request
            .assets
            .iter()
            .filter_map(TransformedAsset::code)
            .collect();
        let mut existing_by_code = self.asset_repo.find_ids_by_codes(&codes).await?;

        let context = AssetWriteContext {
            folder_id: request.folder_id,
            source_file: request.source_file,
        };
        let outcome = UpsertReconciler::reconcile(
            &request.assets,
            request.mode,
            &mut existing_by_code,
            self.asset_repo.as_ref(),
            &context,
        )
        .await;

        info!(
            mode = %request.mode,
            total = outcome.total,
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "批量 upsert 完成"
        );

        Ok(BulkUpsertResponse {
            total: outcome.total,
            inserted: outcome.inserted,
            updated: outcome.updated,
            skipped: outcome.skipped,
            failed: outcome.failed,
            errors: outcome.errors,
        })
    }

    /// 预览表格文件（不落库）
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - category: 资产类别（tanah / bangunan / ...）
    pub async fn preview_file(&self, file_path: &str, category: &str) -> ApiResult<PreviewReport> {
        let category = parse_category(category)?;
        Ok(self
            .importer
            .preview_file(Path::new(file_path), category)
            .await?)
    }

    /// 导入表格文件
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - category: 资产类别
    /// - mode: 导入模式（缺省 upsert）
    /// - folder_id: 归属目录（可选）
    pub async fn import_file(
        &self,
        file_path: &str,
        category: &str,
        mode: Option<&str>,
        folder_id: Option<String>,
    ) -> ApiResult<ImportReport> {
        let category = parse_category(category)?;
        let mode = match mode {
            None => ImportMode::default(),
            Some(raw) => ImportMode::from_str(raw).ok_or_else(|| {
                ApiError::InvalidInput(t_with_args("api.invalid_input", &[("error", raw)]))
            })?,
        };

        let mut options = ImportOptions::new(category, mode);
        options.folder_id = folder_id;

        Ok(self
            .importer
            .import_file(Path::new(file_path), options)
            .await?)
    }

    /// 生成类别导入模板（CSV）
    pub fn generate_template(&self, category: &str) -> ApiResult<TemplateFile> {
        let category = parse_category(category)?;
        let mut buffer = Vec::new();
        write_template_csv(category, &mut buffer)?;
        let content =
            String::from_utf8(buffer).map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(TemplateFile {
            file_name: template_file_name(category),
            content,
        })
    }
}

fn parse_category(raw: &str) -> ApiResult<AssetCategory> {
    AssetCategory::from_str(raw)
        .ok_or_else(|| ApiError::InvalidInput(t_with_args("api.invalid_input", &[("error", raw)])))
}
