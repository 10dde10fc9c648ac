// ==========================================
// BMN 资产台账 - 导入层
// ==========================================
// 职责: 表格文件 → 规范化资产记录 → asset 表
// 支持: CSV, Excel (.xlsx/.xls/.xlsb), ODS
// ==========================================

// 模块声明
pub mod asset_importer_impl;
pub mod asset_importer_trait;
pub mod conflict_handler;
pub mod coordinate_parser;
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod reconciler;
pub mod row_transformer;
pub mod template;

// 重导出核心类型
pub use asset_importer_impl::AssetImporterImpl;
pub use asset_importer_trait::{ImportOptions, ImportReport, PreviewReport};
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use coordinate_parser::{parse_axis, parse_coordinate};
pub use data_cleaner::{normalize_number, DataCleaner as DataCleanerImpl};
pub use dq_validator::DqValidator as DqValidatorImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{build_header_map, map_column_to_field, FieldMapper as FieldMapperImpl};
pub use file_parser::{CsvParser, ExcelParser, ParsedSheet, UniversalFileParser};
pub use reconciler::{RowAction, UpsertReconciler};
pub use row_transformer::RowTransformer as RowTransformerImpl;
pub use template::{template_columns, write_template_csv, TemplateColumn};

// 重导出 Trait 接口
pub use asset_importer_trait::{
    AssetImporter, ConflictHandler, DataCleaner, DqValidator, FieldMapper, FileParser,
    RowTransformer,
};
