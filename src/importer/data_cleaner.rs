// ==========================================
// BMN 资产台账 - 数据清洗器实现
// ==========================================
// 职责: 空白清洗 / NULL 占位符标准化 / 印尼数字与金额格式标准化
// 约定: 印尼格式 "." 为千分位，"," 为小数点（1.234,56 → 1234.56）
// ==========================================

use crate::importer::asset_importer_trait::DataCleaner as DataCleanerTrait;

pub use crate::domain::asset::format_number;

/// 表格中表示"无值"的占位符
const NULL_PLACEHOLDERS: &[&str] = &["-", "--"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value
            .map(|v| self.clean_text(&v))
            .filter(|v| !v.is_empty() && !NULL_PLACEHOLDERS.contains(&v.as_str()))
    }

    fn normalize_number(&self, value: &str) -> f64 {
        normalize_number(value)
    }
}

/// 印尼格式数字/金额标准化
///
/// # 规则
/// - 去掉单位 `m2` / `m²`、货币标记 `Rp` / `IDR`、空白、结尾的 `,-` 或 `-`
/// - 删除 `.`（千分位），`,` 替换为 `.`（小数点）
/// - 无法解析时返回 0，永不报错
///
/// 注意: 纯国际格式的千分位逗号（1,234.56）会被误读，同一列不可混用格式
pub fn normalize_number(value: &str) -> f64 {
    let mut text: String = value
        .to_lowercase()
        .replace("m²", "")
        .replace("m2", "")
        .replace("idr", "")
        .replace("rp", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    // "Rp 1.500.000,-"
    while text.ends_with('-') && text.len() > 1 {
        text.pop();
    }
    if text.ends_with(',') {
        text.pop();
    }

    let normalized = text.replace('.', "").replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
