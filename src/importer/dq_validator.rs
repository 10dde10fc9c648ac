// ==========================================
// BMN 资产台账 - 数据质量校验器实现
// ==========================================
// 职责: 自然键非空校验 + 可疑代码告警 + 汇总
// 原则: 宽松校验，只因 code 为空排除行；名称/类别缺失不拦截
// ==========================================

use crate::domain::asset::{
    fields, TransformedAsset, ValidationError, ValidationReport, ValidationSummary,
};
use crate::domain::types::DqLevel;
use crate::i18n::t_with_args;
use crate::importer::asset_importer_trait::DqValidator as DqValidatorTrait;

/// 默认可疑代码位数（4 位数字多为误填的地区代码）
pub const DEFAULT_SUSPICIOUS_CODE_DIGITS: usize = 4;

pub struct DqValidator {
    suspicious_code_digits: usize,
}

impl DqValidator {
    pub fn new(suspicious_code_digits: usize) -> Self {
        Self {
            suspicious_code_digits,
        }
    }

    fn is_suspicious_code(&self, kode_barang: &str) -> bool {
        self.suspicious_code_digits > 0
            && kode_barang.len() == self.suspicious_code_digits
            && kode_barang.chars().all(|c| c.is_ascii_digit())
    }
}

impl Default for DqValidator {
    fn default() -> Self {
        Self::new(DEFAULT_SUSPICIOUS_CODE_DIGITS)
    }
}

impl DqValidatorTrait for DqValidator {
    /// 校验整批转换结果
    ///
    /// # 规则
    /// - code 去空白后为空 → Error，行被排除
    /// - kode_barang 恰为 N 位数字 → Warning，行保留
    ///
    /// # 不变量
    /// - summary.valid + summary.invalid == summary.total
    fn validate(&self, rows: Vec<TransformedAsset>) -> ValidationReport {
        let total = rows.len();
        let mut valid_data = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut warnings = 0;

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = row.row_number.unwrap_or(index + 1);
            let code = row.code();

            if code.is_none() {
                errors.push(ValidationError {
                    row: row_number,
                    // 原样保留尝试过的 code（可能是空白串）
                    code: row
                        .get(fields::CODE)
                        .filter(|v| !v.is_null())
                        .map(|v| v.to_string()),
                    level: DqLevel::Error,
                    messages: vec![t_with_args(
                        "validation.missing_code",
                        &[("row", row_number.to_string().as_str())],
                    )],
                });
                continue;
            }

            if let Some(kode) = row.text(fields::KODE_BARANG) {
                if self.is_suspicious_code(&kode) {
                    warnings += 1;
                    errors.push(ValidationError {
                        row: row_number,
                        code: code.clone(),
                        level: DqLevel::Warning,
                        messages: vec![t_with_args(
                            "validation.suspicious_code",
                            &[
                                ("code", kode.as_str()),
                                ("digits", self.suspicious_code_digits.to_string().as_str()),
                            ],
                        )],
                    });
                }
            }

            valid_data.push(row);
        }

        let valid = valid_data.len();
        ValidationReport {
            valid_data,
            errors,
            summary: ValidationSummary {
                total,
                valid,
                invalid: total - valid,
                warnings,
            },
        }
    }
}

/// 使用默认阈值校验
pub fn validate(rows: Vec<TransformedAsset>) -> ValidationReport {
    DqValidator::default().validate(rows)
}
