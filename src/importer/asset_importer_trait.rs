// ==========================================
// BMN 资产台账 - 资产导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 表头映射 → 行转换 → 校验 → 对账落库
// ==========================================

use crate::domain::asset::{HeaderBinding, HeaderMap, RawRow, TransformedAsset, ValidationReport};
use crate::domain::types::{AssetCategory, ImportMode};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// 导入选项 / 报告
// ==========================================

/// 单次文件导入的参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    pub category: AssetCategory,
    #[serde(default)]
    pub mode: ImportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl ImportOptions {
    pub fn new(category: AssetCategory, mode: ImportMode) -> Self {
        Self {
            category,
            mode,
            folder_id: None,
        }
    }
}

/// 预览报告（不落库）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewReport {
    pub source_file: String,
    pub header_row: usize, // 表头所在行（1 起）
    pub headers: HeaderMap,
    pub validation: ValidationReport,
}

/// 导入报告（含对账结果）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub mode: ImportMode,
    pub preview: PreviewReport,
    pub outcome: crate::domain::asset::ImportOutcome,
    pub elapsed_ms: u64,
}

// ==========================================
// AssetImporter Trait
// ==========================================
// 用途: 资产导入主接口
// 实现者: AssetImporterImpl
#[async_trait]
pub trait AssetImporter: Send + Sync {
    /// 解析并校验表格文件，不写数据库
    ///
    /// # 参数
    /// - file_path: 表格文件路径（.csv/.xlsx/.xls/.ods）
    /// - category: 目标资产类别（影响名称派生）
    ///
    /// # 返回
    /// - Ok(PreviewReport): 表头映射 + 校验报告
    /// - Err: 文件读取错误、表头缺失等批次级错误
    async fn preview_file(
        &self,
        file_path: &Path,
        category: AssetCategory,
    ) -> ImportResult<PreviewReport>;

    /// 导入表格文件
    ///
    /// # 导入流程
    /// 1. 文件读取与表头识别
    /// 2. 表头映射
    /// 3. 行转换（坐标 / 数字 / 名称 / 自然键）
    /// 4. 校验（空键排除，4 位代码告警）
    /// 5. 按自然键对账落库（逐行，非事务）
    async fn import_file(&self, file_path: &Path, options: ImportOptions)
        -> ImportResult<ImportReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 读取文件为二维单元格网格（不做表头识别）
    fn read_grid(&self, file_path: &Path) -> ImportResult<Vec<Vec<crate::domain::asset::CellValue>>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
pub trait FieldMapper: Send + Sync {
    /// 表头文本 → 规范字段名（全函数，永不失败）
    fn map_column(&self, header: &str) -> String;

    /// 构建整张表的表头映射（空白表头跳过，逐列调用 map_column）
    fn build_header_map(&self, headers: &[String]) -> HeaderMap {
        let bindings = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(column, h)| HeaderBinding {
                column,
                header: h.trim().to_string(),
                field: self.map_column(h),
            })
            .collect();
        HeaderMap::new(bindings)
    }
}

// ==========================================
// DataCleaner Trait
// ==========================================
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（去首尾空白，内部连续空白折叠为一个空格）
    fn clean_text(&self, value: &str) -> String;

    /// 标准化 NULL 值（清洗后为空或为占位符 "-" / "--" → None）
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 印尼格式数字/金额 → f64（失败返回 0）
    fn normalize_number(&self, value: &str) -> f64;
}

// ==========================================
// RowTransformer Trait
// ==========================================
pub trait RowTransformer: Send + Sync {
    /// 单行转换；永不失败，每行恰好产出一个 TransformedAsset
    ///
    /// # 参数
    /// - raw_row: 原始行
    /// - header_map: 表头映射
    /// - row_index: 数据行序号（0 起）
    /// - category: 资产类别
    fn transform(
        &self,
        raw_row: &RawRow,
        header_map: &HeaderMap,
        row_index: usize,
        category: AssetCategory,
    ) -> TransformedAsset;
}

// ==========================================
// DqValidator Trait
// ==========================================
pub trait DqValidator: Send + Sync {
    /// 校验整批转换结果
    fn validate(&self, rows: Vec<TransformedAsset>) -> ValidationReport;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
pub trait ConflictHandler: Send + Sync {
    /// 检测同批次内重复自然键
    ///
    /// # 返回
    /// - Vec<(usize, String)>: (行号, code)，首次出现之后的重复行
    fn detect_duplicates(&self, rows: &[TransformedAsset]) -> Vec<(usize, String)>;
}
