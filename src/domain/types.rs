// ==========================================
// BMN 资产台账 - 领域类型定义
// ==========================================
// 职责: 资产类别 / 导入模式 / DQ 级别 / 坐标值对象
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 资产类别 (Asset Category)
// ==========================================
// 对应前端每个资产页面；只有 Bangunan 在名称派生上有差异
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Tanah,     // 土地
    Bangunan,  // 建筑/房屋
    Kendaraan, // 车辆
    Faskes,    // 医疗设施
    Harkan,    // 维修保养状态
    Faslabuh,  // 港口设施
    Faslan,    // 基地设施
    Fasharpan, // 维修设施
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 8] = [
        AssetCategory::Tanah,
        AssetCategory::Bangunan,
        AssetCategory::Kendaraan,
        AssetCategory::Faskes,
        AssetCategory::Harkan,
        AssetCategory::Faslabuh,
        AssetCategory::Faslan,
        AssetCategory::Fasharpan,
    ];

    /// 从页面/命令行参数解析（大小写不敏感，兼容英文别名）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tanah" | "land" => Some(AssetCategory::Tanah),
            "bangunan" | "building" | "gedung" => Some(AssetCategory::Bangunan),
            "kendaraan" | "vehicle" => Some(AssetCategory::Kendaraan),
            "faskes" | "medical" => Some(AssetCategory::Faskes),
            "harkan" | "maintenance" => Some(AssetCategory::Harkan),
            "faslabuh" => Some(AssetCategory::Faslabuh),
            "faslan" => Some(AssetCategory::Faslan),
            "fasharpan" => Some(AssetCategory::Fasharpan),
            _ => None,
        }
    }

    /// 写入 asset_type 列的标识
    pub fn slug(&self) -> &'static str {
        match self {
            AssetCategory::Tanah => "tanah",
            AssetCategory::Bangunan => "bangunan",
            AssetCategory::Kendaraan => "kendaraan",
            AssetCategory::Faskes => "faskes",
            AssetCategory::Harkan => "harkan",
            AssetCategory::Faslabuh => "faslabuh",
            AssetCategory::Faslan => "faslan",
            AssetCategory::Fasharpan => "fasharpan",
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self, AssetCategory::Bangunan)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

// ==========================================
// 导入模式 (Import Mode)
// ==========================================
// 序列化格式与前端 bulk upsert 请求一致: upsert / insert-only / update-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    #[default]
    Upsert,
    InsertOnly,
    UpdateOnly,
}

impl ImportMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upsert" => Some(ImportMode::Upsert),
            "insert-only" | "insert_only" | "insert" => Some(ImportMode::InsertOnly),
            "update-only" | "update_only" | "update" => Some(ImportMode::UpdateOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Upsert => write!(f, "upsert"),
            ImportMode::InsertOnly => write!(f, "insert-only"),
            ImportMode::UpdateOnly => write!(f, "update-only"),
        }
    }
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Error,    // 错误（行被排除）
    Warning,  // 警告（行保留）
    Conflict, // 同批次主键重复（行保留，后写覆盖）
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Error => write!(f, "ERROR"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Conflict => write!(f, "CONFLICT"),
        }
    }
}

// ==========================================
// Coordinate - 坐标值对象
// ==========================================
// 十进制度；latitude ∈ [-90, 90]，longitude ∈ [-180, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// 构造坐标，超出范围或非有限值时返回 None
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// 规范 DMS 显示串，例如 `6°09'51.78"S 106°50'22.68"E`
    pub fn to_dms_string(&self) -> String {
        format!(
            "{} {}",
            format_dms(self.latitude, 'N', 'S'),
            format_dms(self.longitude, 'E', 'W')
        )
    }
}

/// 按百分之一秒取整后再拆分，避免出现 60.00 秒
fn format_dms(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let hundredths = (value.abs() * 360_000.0).round() as u64;
    let degrees = hundredths / 360_000;
    let minutes = (hundredths % 360_000) / 6_000;
    let seconds = (hundredths % 6_000) as f64 / 100.0;
    format!(
        "{}°{:02}'{:05.2}\"{}",
        degrees, minutes, seconds, hemisphere
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!(AssetCategory::from_str("Tanah"), Some(AssetCategory::Tanah));
        assert_eq!(
            AssetCategory::from_str(" building "),
            Some(AssetCategory::Bangunan)
        );
        assert_eq!(AssetCategory::from_str("kapal"), None);
    }

    #[test]
    fn test_import_mode_serde() {
        let json = serde_json::to_string(&ImportMode::InsertOnly).unwrap();
        assert_eq!(json, "\"insert-only\"");
        let mode: ImportMode = serde_json::from_str("\"update-only\"").unwrap();
        assert_eq!(mode, ImportMode::UpdateOnly);
    }

    #[test]
    fn test_coordinate_range() {
        assert!(Coordinate::new(-6.2, 106.8).is_some());
        assert!(Coordinate::new(95.0, 106.8).is_none());
        assert!(Coordinate::new(-6.2, 181.0).is_none());
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_to_dms_string() {
        let coord = Coordinate::new(-6.164383, 106.8396333).unwrap();
        assert_eq!(coord.to_dms_string(), "6°09'51.78\"S 106°50'22.68\"E");
    }
}
