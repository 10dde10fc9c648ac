// ==========================================
// BMN 资产台账 - 资产导入领域模型
// ==========================================
// 用途: 导入管道各阶段的中间产物与结果
// 生命周期: 全部为请求级临时值，仅存储表跨请求存在
// ==========================================

use crate::domain::types::DqLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 规范字段名
// ==========================================
pub mod fields {
    pub const KODE_BARANG: &str = "kode_barang";
    pub const NUP: &str = "nup";
    pub const NAMA_BARANG: &str = "nama_barang";
    pub const NAMA_ASSET: &str = "nama_asset";
    pub const JENIS_BMN: &str = "jenis_bmn";
    pub const LUAS_TANAH_SELURUHNYA: &str = "luas_tanah_seluruhnya";
    pub const LUAS_BANGUNAN: &str = "luas_bangunan";
    pub const NILAI_PEROLEHAN: &str = "nilai_perolehan";
    pub const TANGGAL_PEROLEHAN: &str = "tanggal_perolehan";
    pub const ALAMAT: &str = "alamat";
    pub const KODE_KOTA: &str = "kode_kota";
    pub const KODE_WILAYAH: &str = "kode_wilayah";
    pub const KOORDINAT: &str = "koordinat";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const AREA: &str = "area";
    pub const OCCUPANT_NAME: &str = "occupant_name";
    pub const STATUS_PENGGUNAAN: &str = "status_penggunaan";
    pub const KONDISI: &str = "kondisi";
    pub const NO_SERTIFIKAT: &str = "no_sertifikat";
    pub const KETERANGAN: &str = "keterangan";

    // 派生字段
    pub const CODE: &str = "code";
    pub const NAME: &str = "name";
    pub const CATEGORY: &str = "category";
    pub const LUAS: &str = "luas";
    pub const ASSET_TYPE: &str = "asset_type";

    /// 需要按印尼数字格式标准化的字段
    pub const NUMERIC_FIELDS: &[&str] = &[LUAS_TANAH_SELURUHNYA, LUAS_BANGUNAN, NILAI_PEROLEHAN];
}

// ==========================================
// CellValue - 单元格原始值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 转为去空白的文本；空值返回 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

/// 整数值不带小数点（Excel 中 NUP 常为数值单元格）
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ==========================================
// RawRow - 表格原始行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub index: usize, // 数据行序号（0 起，表头之后）
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    pub fn cell(&self, column: usize) -> &CellValue {
        self.cells.get(column).unwrap_or(&CellValue::Empty)
    }
}

// ==========================================
// HeaderMap - 表头 → 规范字段映射
// ==========================================
// 每次导入构建一次，之后只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBinding {
    pub column: usize,  // 列位置
    pub header: String, // 表格中原样的表头
    pub field: String,  // 规范字段名或 extra_*
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMap {
    bindings: Vec<HeaderBinding>,
}

impl HeaderMap {
    pub fn new(bindings: Vec<HeaderBinding>) -> Self {
        Self { bindings }
    }

    /// 按列顺序迭代（重复字段时后出现的列覆盖前者）
    pub fn bindings(&self) -> &[HeaderBinding] {
        &self.bindings
    }

    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.header == header)
            .map(|b| b.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ==========================================
// FieldValue - 清洗后的标量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 文本视图；数值按 format_number 输出，Null/空串返回 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

// ==========================================
// TransformedAsset - 转换后的资产行
// ==========================================
// JSON 形态为扁平对象；行号放在 `_row`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformedAsset {
    #[serde(rename = "_row", default, skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl TransformedAsset {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number: Some(row_number),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn set_text(&mut self, field: &str, value: impl Into<String>) {
        self.set(field, FieldValue::Text(value.into()));
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// 非空文本（Null、空白串视为不存在）
    pub fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(|v| v.as_text())
    }

    pub fn has(&self, field: &str) -> bool {
        self.text(field).is_some()
    }

    /// 自然键
    pub fn code(&self) -> Option<String> {
        self.text(fields::CODE)
    }

    pub fn name(&self) -> Option<String> {
        self.text(fields::NAME)
    }
}

// ==========================================
// ValidationError - 行级校验问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub code: Option<String>,
    pub level: DqLevel,
    pub messages: Vec<String>,
}

// ==========================================
// ValidationSummary / ValidationReport
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid_data: Vec<TransformedAsset>,
    pub errors: Vec<ValidationError>,
    pub summary: ValidationSummary,
}

// ==========================================
// ImportOutcome - 对账结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub code: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl ImportOutcome {
    pub fn record_failure(&mut self, row: usize, code: Option<String>, error: String) {
        self.failed += 1;
        self.errors.push(RowError { row, code, error });
    }
}

// ==========================================
// 存储侧实体
// ==========================================

/// 写入时附带的批次元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetWriteContext {
    pub folder_id: Option<String>,
    pub source_file: Option<String>,
}

/// asset 表中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub id: i64,
    pub code: String,
    pub asset_type: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub folder_id: Option<String>,
    pub source_file: Option<String>,
    pub data: TransformedAsset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
