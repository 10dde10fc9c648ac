// ==========================================
// BMN 资产台账 - 行转换器实现
// ==========================================
// 职责: 原始行 + 表头映射 → TransformedAsset
// 派生: name / nama_barang 回填 / category / luas / code / asset_type / 坐标
// 约束: 永不失败；每行恰好产出一条结果
// ==========================================

use crate::domain::asset::{fields, CellValue, FieldValue, HeaderMap, RawRow, TransformedAsset};
use crate::domain::types::AssetCategory;
use crate::importer::asset_importer_trait::{
    DataCleaner as DataCleanerTrait, RowTransformer as RowTransformerTrait,
};
use crate::importer::coordinate_parser::{parse_axis, parse_coordinate};
use crate::importer::data_cleaner::DataCleaner;

/// 未提供 jenis_bmn 时的默认类别标签
pub const DEFAULT_CATEGORY_LABEL: &str = "Tanah";

pub struct RowTransformer {
    default_category: String,
    cleaner: DataCleaner,
}

impl RowTransformer {
    pub fn new(default_category: impl Into<String>) -> Self {
        Self {
            default_category: default_category.into(),
            cleaner: DataCleaner,
        }
    }

    /// 单元格 → 字段值
    ///
    /// - 空白或占位符 "-" → Null
    /// - 数值字段: 数字单元格原样保留，文本按印尼格式标准化
    fn cell_to_field_value(&self, field: &str, cell: &CellValue) -> FieldValue {
        let numeric = fields::NUMERIC_FIELDS.contains(&field);
        if let (true, CellValue::Number(n)) = (numeric, cell) {
            return FieldValue::Number(*n);
        }

        match self.cleaner.normalize_null(cell.as_text()) {
            Some(text) if numeric => FieldValue::Number(self.cleaner.normalize_number(&text)),
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Null,
        }
    }
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_LABEL)
    }
}

impl RowTransformerTrait for RowTransformer {
    fn transform(
        &self,
        raw_row: &RawRow,
        header_map: &HeaderMap,
        row_index: usize,
        category: AssetCategory,
    ) -> TransformedAsset {
        let row_number = row_index + 1;
        let mut asset = TransformedAsset::new(row_number);

        // 1. 逐列赋值（同名字段后出现的列覆盖前者）
        for binding in header_map.bindings() {
            let value = self.cell_to_field_value(&binding.field, raw_row.cell(binding.column));
            asset.set(&binding.field, value);
        }

        // 坐标
        resolve_coordinates(&mut asset);

        // 2. 显示名称 + nama_barang 回填
        let name = resolve_name(&asset, category, row_number);
        if !name.is_empty() && !asset.has(fields::NAMA_BARANG) {
            asset.set_text(fields::NAMA_BARANG, name.clone());
        }
        asset.set_text(fields::NAME, name);

        // 3. 类别
        let category_label = asset
            .text(fields::JENIS_BMN)
            .unwrap_or_else(|| self.default_category.clone());
        asset.set_text(fields::CATEGORY, category_label);
        asset.set_text(fields::ASSET_TYPE, category.slug());

        // 4. 兼容旧版的 luas 文本
        if let Some(area) = asset
            .get(fields::LUAS_TANAH_SELURUHNYA)
            .filter(|v| !v.is_null())
            .and_then(|v| v.as_text())
        {
            asset.set_text(fields::LUAS, format!("{} m2", area));
        }

        // 5-6. 自然键
        let code = derive_code(&asset, row_number);
        asset.set_text(fields::CODE, code);

        asset
    }
}

/// 使用默认类别标签转换单行
pub fn transform(
    raw_row: &RawRow,
    header_map: &HeaderMap,
    row_index: usize,
    category: AssetCategory,
) -> TransformedAsset {
    RowTransformer::default().transform(raw_row, header_map, row_index, category)
}

// ==========================================
// 辅助函数
// ==========================================

/// 坐标字段标准化
///
/// - 独立的 latitude / longitude 列按单轴解析，越界或无法解析 → Null
/// - koordinat 解析成功时覆盖经纬度，并改写为规范 DMS 串；失败 → Null
fn resolve_coordinates(asset: &mut TransformedAsset) {
    for (field, limit) in [(fields::LATITUDE, 90.0), (fields::LONGITUDE, 180.0)] {
        if asset.get(field).is_none() {
            continue;
        }
        let value = match asset.get(field) {
            Some(FieldValue::Number(n)) => Some(*n),
            Some(other) => other.as_text().and_then(|t| parse_axis(&t)),
            None => None,
        }
        .filter(|v| v.abs() <= limit);

        asset.set(field, value.map(FieldValue::Number).unwrap_or(FieldValue::Null));
    }

    let Some(raw) = asset.text(fields::KOORDINAT) else {
        return;
    };

    match parse_coordinate(&raw) {
        Some(coord) => {
            asset.set(fields::LATITUDE, FieldValue::Number(coord.latitude));
            asset.set(fields::LONGITUDE, FieldValue::Number(coord.longitude));
            asset.set_text(fields::KOORDINAT, coord.to_dms_string());
        }
        None => asset.set(fields::KOORDINAT, FieldValue::Null),
    }
}

/// 名称回退链
///
/// - 建筑类: area → occupant_name → "Building {n}"
/// - 其他类: nama_barang → nama_asset → area → ""
fn resolve_name(asset: &TransformedAsset, category: AssetCategory, row_number: usize) -> String {
    if category.is_building() {
        asset
            .text(fields::AREA)
            .or_else(|| asset.text(fields::OCCUPANT_NAME))
            .unwrap_or_else(|| format!("Building {}", row_number))
    } else {
        asset
            .text(fields::NAMA_BARANG)
            .or_else(|| asset.text(fields::NAMA_ASSET))
            .or_else(|| asset.text(fields::AREA))
            .unwrap_or_default()
    }
}

/// 自然键派生
///
/// - kode_barang + nup → "{kode_barang}-{nup}"（kode_barang 是类别码，nup 区分同类物品）
/// - 只有其一 → 直接使用
/// - 都没有 → "ROW_{n}"，不从无关列（如城市代码）拼凑
fn derive_code(asset: &TransformedAsset, row_number: usize) -> String {
    match (asset.text(fields::KODE_BARANG), asset.text(fields::NUP)) {
        (Some(kode), Some(nup)) => format!("{}-{}", kode, nup),
        (Some(kode), None) => kode,
        (None, Some(nup)) => nup,
        (None, None) => format!("ROW_{}", row_number),
    }
}
