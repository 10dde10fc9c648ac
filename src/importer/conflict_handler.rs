// ==========================================
// BMN 资产台账 - 冲突处理器实现
// ==========================================
// 职责: 检测同批次内重复自然键
// 策略: 重复行不排除，对账时后写覆盖；仅以 CONFLICT 级别提示
// ==========================================

use crate::domain::asset::{TransformedAsset, ValidationError};
use crate::domain::types::DqLevel;
use crate::i18n::t_with_args;
use crate::importer::asset_importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::HashMap;

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 检测同批次内重复 code
    ///
    /// # 返回
    /// - Vec<(行号, code)>: 重复记录列表（不包括第一次出现）
    fn detect_duplicates(&self, rows: &[TransformedAsset]) -> Vec<(usize, String)> {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let row_number = row.row_number.unwrap_or(index + 1);
            if let Some(code) = row.code() {
                if first_occurrence.contains_key(&code) {
                    duplicates.push((row_number, code));
                } else {
                    first_occurrence.insert(code, row_number);
                }
            }
        }

        duplicates
    }
}

impl ConflictHandler {
    /// 重复记录 → CONFLICT 提示
    pub fn conflict_notices(&self, rows: &[TransformedAsset]) -> Vec<ValidationError> {
        self.detect_duplicates(rows)
            .into_iter()
            .map(|(row, code)| ValidationError {
                row,
                messages: vec![t_with_args("validation.duplicate_code", &[("code", code.as_str())])],
                code: Some(code),
                level: DqLevel::Conflict,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::fields;

    fn create_test_asset(code: Option<&str>, row_number: usize) -> TransformedAsset {
        let mut asset = TransformedAsset::new(row_number);
        if let Some(code) = code {
            asset.set_text(fields::CODE, code);
        }
        asset
    }

    #[test]
    fn test_detect_duplicates_none() {
        let handler = ConflictHandler;
        let rows = vec![
            create_test_asset(Some("T-01-1"), 1),
            create_test_asset(Some("T-02"), 2),
        ];

        assert!(handler.detect_duplicates(&rows).is_empty());
    }

    #[test]
    fn test_detect_duplicates_multiple() {
        let handler = ConflictHandler;
        let rows = vec![
            create_test_asset(Some("T-01-1"), 1),
            create_test_asset(Some("T-01-1"), 2), // 重复
            create_test_asset(None, 3),
            create_test_asset(Some("T-01-1"), 4), // 再次重复
        ];

        let duplicates = handler.detect_duplicates(&rows);

        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0], (2, "T-01-1".to_string()));
        assert_eq!(duplicates[1].0, 4);
    }

    #[test]
    fn test_conflict_notices_level() {
        let handler = ConflictHandler;
        let rows = vec![
            create_test_asset(Some("A"), 1),
            create_test_asset(Some("A"), 2),
        ];

        let notices = handler.conflict_notices(&rows);

        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, DqLevel::Conflict);
        assert_eq!(notices[0].code, Some("A".to_string()));
    }
}
