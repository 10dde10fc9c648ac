// ==========================================
// BMN 资产台账 - 坐标解析器
// ==========================================
// 职责: 自由文本坐标 → (latitude, longitude)
// 支持: DMS（含/不含秒）/ 分号分隔 / 印尼小数逗号 / 空白分隔
// 约束: 永不报错，解析失败返回 None
// ==========================================

use crate::domain::types::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;

// 度/分/秒符号容错: ° ᵒ º o / ′ ' ´ / ″ " ''
static FULL_DMS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(\d+(?:[.,]\d+)?)\s*[°ᵒºo]\s*(\d+(?:[.,]\d+)?)\s*['′´]\s*(\d+(?:[.,]\d+)?)\s*(?:''|["″])\s*([NS])[\s,;&]*(\d+(?:[.,]\d+)?)\s*[°ᵒºo]\s*(\d+(?:[.,]\d+)?)\s*['′´]\s*(\d+(?:[.,]\d+)?)\s*(?:''|["″])\s*([EW])"#,
    )
    .unwrap()
});

static SIMPLE_DMS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(\d+(?:[.,]\d+)?)\s*[°ᵒºo]\s*(\d+(?:[.,]\d+)?)\s*['′´]\s*([NS])[\s,;&]*(\d+(?:[.,]\d+)?)\s*[°ᵒºo]\s*(\d+(?:[.,]\d+)?)\s*['′´]\s*([EW])"#,
    )
    .unwrap()
});

// 单轴 DMS（用于独立的 latitude/longitude 列）
static AXIS_DMS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(\d+(?:[.,]\d+)?)\s*[°ᵒºo]\s*(?:(\d+(?:[.,]\d+)?)\s*['′´])?\s*(?:(\d+(?:[.,]\d+)?)\s*(?:''|["″]))?\s*([NSEW])$"#,
    )
    .unwrap()
});

static DECIMAL_COMMA_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d),(\d)").unwrap());

static SEPARATOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").unwrap());

/// 解析坐标文本
///
/// # 策略（按顺序，首个成功者生效）
/// 1. 完整 DMS: `6°09'51.78"S 106°50'22.68"E`
/// 2. 简单 DMS: `6°09'S 106°50'E`（秒按 0）
/// 3. 分号分隔小数: `-6,2088; 106,8456`
/// 4. 逗号歧义小数: 1 个逗号为分隔符 / 多个逗号为印尼小数点 / 无逗号按空白拆分
///
/// # 返回
/// - Some(Coordinate): 解析成功且在合法范围内
/// - None: 空值、`-` 或所有策略均失败
pub fn parse_coordinate(text: &str) -> Option<Coordinate> {
    let input = text.trim().replace('−', "-");
    if input.is_empty() || input == "-" {
        return None;
    }

    parse_full_dms(&input)
        .or_else(|| parse_simple_dms(&input))
        .or_else(|| parse_semicolon_decimal(&input))
        .or_else(|| parse_comma_decimal(&input))
}

/// 解析单轴坐标值（小数或带半球字母的 DMS）
///
/// 小数中的逗号视为小数点；半球字母 S/W 取负。
pub fn parse_axis(text: &str) -> Option<f64> {
    let input = text.trim().replace('−', "-");
    if input.is_empty() || input == "-" {
        return None;
    }

    if let Some(caps) = AXIS_DMS_PATTERN.captures(&input) {
        let degrees = parse_component(caps.get(1)?.as_str())?;
        let minutes = caps
            .get(2)
            .and_then(|m| parse_component(m.as_str()))
            .unwrap_or(0.0);
        let seconds = caps
            .get(3)
            .and_then(|m| parse_component(m.as_str()))
            .unwrap_or(0.0);
        let hemisphere = caps.get(4)?.as_str();
        return Some(dms_to_decimal(degrees, minutes, seconds, hemisphere));
    }

    parse_component(&input).filter(|v| v.is_finite())
}

// ==========================================
// 策略实现
// ==========================================

fn parse_full_dms(input: &str) -> Option<Coordinate> {
    let caps = FULL_DMS_PATTERN.captures(input)?;
    let latitude = dms_to_decimal(
        parse_component(caps.get(1)?.as_str())?,
        parse_component(caps.get(2)?.as_str())?,
        parse_component(caps.get(3)?.as_str())?,
        caps.get(4)?.as_str(),
    );
    let longitude = dms_to_decimal(
        parse_component(caps.get(5)?.as_str())?,
        parse_component(caps.get(6)?.as_str())?,
        parse_component(caps.get(7)?.as_str())?,
        caps.get(8)?.as_str(),
    );
    Coordinate::new(latitude, longitude)
}

fn parse_simple_dms(input: &str) -> Option<Coordinate> {
    let caps = SIMPLE_DMS_PATTERN.captures(input)?;
    let latitude = dms_to_decimal(
        parse_component(caps.get(1)?.as_str())?,
        parse_component(caps.get(2)?.as_str())?,
        0.0,
        caps.get(3)?.as_str(),
    );
    let longitude = dms_to_decimal(
        parse_component(caps.get(4)?.as_str())?,
        parse_component(caps.get(5)?.as_str())?,
        0.0,
        caps.get(6)?.as_str(),
    );
    Coordinate::new(latitude, longitude)
}

fn parse_semicolon_decimal(input: &str) -> Option<Coordinate> {
    if !input.contains(';') {
        return None;
    }
    let parts: Vec<&str> = input
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 2 {
        return None;
    }
    let first = parse_component(parts[0])?;
    let second = parse_component(parts[1])?;
    resolve_pair(first, second)
}

fn parse_comma_decimal(input: &str) -> Option<Coordinate> {
    let comma_count = input.matches(',').count();

    let tokens: Vec<String> = match comma_count {
        // 单个逗号: 作为 lat,lon 分隔符（点号小数）
        1 => input.split(',').map(|t| t.trim().to_string()).collect(),
        // 无逗号: 空白分隔
        0 => input.split_whitespace().map(str::to_string).collect(),
        // 多个逗号: 印尼小数点，先把 数字,数字 还原为 数字.数字
        _ => {
            let normalized = DECIMAL_COMMA_PATTERN.replace_all(input, "$1.$2");
            SEPARATOR_PATTERN
                .split(&normalized)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        }
    };

    if tokens.len() != 2 {
        return None;
    }

    let first = tokens[0].parse::<f64>().ok()?;
    let second = tokens[1].parse::<f64>().ok()?;
    resolve_pair(first, second)
}

// ==========================================
// 辅助函数
// ==========================================

/// 经纬度自动识别：绝对值 > 90 的一侧是经度；都不超过时按 (lat, lon)
fn resolve_pair(first: f64, second: f64) -> Option<Coordinate> {
    if first.abs() > 90.0 && second.abs() <= 90.0 {
        Coordinate::new(second, first)
    } else {
        Coordinate::new(first, second)
    }
}

fn parse_component(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: &str) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase().as_str() {
        "S" | "W" => -value,
        _ => value,
    }
}
