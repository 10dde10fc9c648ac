// ==========================================
// BMN 资产台账 - 表头映射器实现
// ==========================================
// 职责: 任意表头文本 → 规范字段名
// 流程: 标准化 → 单位代码直通 extra_* → 精确查表 → 有序规则（先具体后泛化）→ extra_* 兜底
// 红线: 含 kota/kab/wilayah 的表头永不映射到 kode_barang
// ==========================================

use crate::domain::asset::{fields, HeaderMap};
use crate::importer::asset_importer_trait::FieldMapper as FieldMapperTrait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_column(&self, header: &str) -> String {
        map_column_to_field(header)
    }
}

// ==========================================
// 精确查表
// ==========================================
// 键为标准化后的表头；规范字段名本身也在表内（保证幂等）
static EXACT_HEADERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let table: &[(&str, &[&str])] = &[
        (
            fields::KODE_BARANG,
            &[
                "kode barang",
                "kode brg",
                "kd barang",
                "kd brg",
                "kode aset",
                "kode asset",
                "kode bmn",
                "item code",
                "asset code",
            ],
        ),
        (
            fields::NUP,
            &[
                "nup",
                "no urut",
                "no. urut",
                "nomor urut",
                "nomor urut pendaftaran",
                "registration number",
            ],
        ),
        (
            fields::NAMA_BARANG,
            &["nama", "nama barang", "nama brg", "uraian barang", "item name"],
        ),
        (
            fields::NAMA_ASSET,
            &["nama asset", "nama aset", "asset name"],
        ),
        (
            fields::JENIS_BMN,
            &["jenis bmn", "jenis", "jenis barang", "kategori", "category"],
        ),
        (
            fields::LUAS_TANAH_SELURUHNYA,
            &[
                "luas",
                "luas (m2)",
                "luas (m²)",
                "luas m2",
                "luas tanah",
                "luas tanah (m2)",
                "luas tanah seluruhnya",
                "land area",
            ],
        ),
        (
            fields::LUAS_BANGUNAN,
            &["luas bangunan", "luas bangunan (m2)", "building area"],
        ),
        (
            fields::NILAI_PEROLEHAN,
            &[
                "nilai perolehan",
                "nilai",
                "nilai aset",
                "harga perolehan",
                "acquisition value",
            ],
        ),
        (
            fields::TANGGAL_PEROLEHAN,
            &[
                "tanggal perolehan",
                "tgl perolehan",
                "tgl. perolehan",
                "acquisition date",
            ],
        ),
        (
            fields::ALAMAT,
            &["alamat", "lokasi", "alamat lengkap", "address", "location"],
        ),
        (
            fields::KODE_KOTA,
            &[
                "kode kota",
                "kode kota/kabupaten",
                "kode kab/kota",
                "kode kabupaten",
                "city code",
            ],
        ),
        (
            fields::KODE_WILAYAH,
            &["kode wilayah", "kode provinsi", "kode prov", "region code"],
        ),
        (
            fields::KOORDINAT,
            &["koordinat", "titik koordinat", "coordinate", "coordinates"],
        ),
        (fields::LATITUDE, &["lat", "latitude", "lintang"]),
        (fields::LONGITUDE, &["long", "lng", "lon", "longitude", "bujur"]),
        (fields::AREA, &["area", "gedung", "nama gedung", "building"]),
        (
            fields::OCCUPANT_NAME,
            &["penghuni", "nama penghuni", "occupant", "occupant name"],
        ),
        (
            fields::STATUS_PENGGUNAAN,
            &["status penggunaan", "status", "penggunaan", "usage status"],
        ),
        (
            fields::KONDISI,
            &["kondisi", "kondisi barang", "condition"],
        ),
        (
            fields::NO_SERTIFIKAT,
            &["no sertifikat", "nomor sertifikat", "no. sertifikat", "sertifikat"],
        ),
        (
            fields::KETERANGAN,
            &["keterangan", "ket", "catatan", "notes", "remarks"],
        ),
    ];

    let mut map = HashMap::new();
    for (field, variants) in table {
        map.insert(*field, *field);
        for variant in *variants {
            map.insert(*variant, *field);
        }
    }
    map
});

// ==========================================
// 有序规则
// ==========================================
// 顺序即优先级：城市/地区代码规则必须在通用 kode 规则之前
struct MappingRule {
    pattern: Regex,
    field: &'static str,
}

fn rule(pattern: &str, field: &'static str) -> MappingRule {
    MappingRule {
        pattern: Regex::new(pattern).unwrap(),
        field,
    }
}

static MAPPING_RULES: Lazy<Vec<MappingRule>> = Lazy::new(|| {
    vec![
        rule(r"\b(kode|kd)\b.*\b(kota|kab)", fields::KODE_KOTA),
        rule(r"\b(kode|kd)\b.*\b(wilayah|prov)", fields::KODE_WILAYAH),
        rule(r"\bnup\b|urut", fields::NUP),
        rule(r"\b(kode|kd)\b", fields::KODE_BARANG),
        rule(r"luas.*bangunan", fields::LUAS_BANGUNAN),
        rule(r"\bluas\b", fields::LUAS_TANAH_SELURUHNYA),
        rule(r"koordinat|coordinate", fields::KOORDINAT),
        rule(r"\blat\b|latitude|lintang", fields::LATITUDE),
        rule(r"\b(long|lng|lon)\b|longitude|bujur", fields::LONGITUDE),
        rule(r"penghuni|occupant", fields::OCCUPANT_NAME),
        rule(r"\bnama\b.*\bas?se?t\b", fields::NAMA_ASSET),
        rule(r"\bnama\b|uraian", fields::NAMA_BARANG),
        rule(r"\bjenis\b|kategori|category", fields::JENIS_BMN),
        rule(r"alamat|lokasi|address", fields::ALAMAT),
        rule(r"\bnilai\b|harga", fields::NILAI_PEROLEHAN),
        rule(r"tanggal|\btgl\b", fields::TANGGAL_PEROLEHAN),
        rule(r"sertifikat", fields::NO_SERTIFIKAT),
        rule(r"kondisi", fields::KONDISI),
        rule(r"\bstatus\b", fields::STATUS_PENGGUNAAN),
        rule(r"keterangan|catatan|\bket\b", fields::KETERANGAN),
        rule(r"gedung|\barea\b", fields::AREA),
    ]
});

// 城市/地区指示词（kode_barang 守卫）
static REGION_GUARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"kota|kab|wilayah").unwrap());

// 组织单位/位置代码（SIMAK-BMN 导出常见），不是物品代码
static UNIT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(kode|kd)\b.*\b(lokasi|satker|upb|uakpb|unit|ruang(an)?)\b").unwrap()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static EXTRA_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^extra_[a-z0-9_]+$").unwrap());

/// 表头 → 规范字段名
///
/// 纯函数、全函数、幂等：`map(map(h)) == map(h)`
pub fn map_column_to_field(header: &str) -> String {
    let normalized = normalize_header(header);

    // 已是兜底字段名时原样返回
    if EXTRA_FIELD.is_match(&normalized) {
        return normalized;
    }

    if UNIT_CODE.is_match(&normalized) {
        return fallback_field(&normalized);
    }

    if let Some(field) = EXACT_HEADERS.get(normalized.as_str()) {
        if !is_guarded(field, &normalized) {
            return (*field).to_string();
        }
    }

    for rule in MAPPING_RULES.iter() {
        if rule.pattern.is_match(&normalized) && !is_guarded(rule.field, &normalized) {
            return rule.field.to_string();
        }
    }

    fallback_field(&normalized)
}

/// 构建表头映射；空白表头单元格跳过
pub fn build_header_map(headers: &[String]) -> HeaderMap {
    FieldMapper.build_header_map(headers)
}

/// 小写 + 去首尾空白 + 折叠内部空白
pub fn normalize_header(header: &str) -> String {
    WHITESPACE
        .replace_all(header.trim(), " ")
        .to_lowercase()
}

fn is_guarded(field: &str, normalized: &str) -> bool {
    field == fields::KODE_BARANG && REGION_GUARD.is_match(normalized)
}

fn fallback_field(normalized: &str) -> String {
    let mut slug = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "extra_unnamed".to_string()
    } else {
        format!("extra_{}", slug)
    }
}
