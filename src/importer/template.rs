// ==========================================
// BMN 资产台账 - 导入模板生成
// ==========================================
// 职责: 每个资产类别一份模板（规范表头 + 一行示例）
// 约束: 每个模板表头经 map_column_to_field 必须映射回其声明的字段
// ==========================================

use crate::domain::asset::fields;
use crate::domain::types::AssetCategory;
use crate::importer::error::ImportResult;
use std::io::Write;

/// 模板列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateColumn {
    pub header: &'static str,
    pub field: &'static str,
    pub example: &'static str,
}

const fn col(header: &'static str, field: &'static str, example: &'static str) -> TemplateColumn {
    TemplateColumn {
        header,
        field,
        example,
    }
}

const TANAH_COLUMNS: &[TemplateColumn] = &[
    col("Kode Barang", fields::KODE_BARANG, "2010101001"),
    col("NUP", fields::NUP, "1"),
    col("Nama Barang", fields::NAMA_BARANG, "Tanah Bangunan Kantor Pemerintah"),
    col("Jenis BMN", fields::JENIS_BMN, "Tanah"),
    col("Luas Tanah Seluruhnya", fields::LUAS_TANAH_SELURUHNYA, "1.500,00"),
    col("Nilai Perolehan", fields::NILAI_PEROLEHAN, "2.500.000.000"),
    col("Tanggal Perolehan", fields::TANGGAL_PEROLEHAN, "2015-03-12"),
    col("Alamat", fields::ALAMAT, "Jl. Gunung Sahari No. 67, Jakarta Pusat"),
    col("Kode Kota", fields::KODE_KOTA, "3171"),
    col("Kode Wilayah", fields::KODE_WILAYAH, "31"),
    col("Koordinat", fields::KOORDINAT, "-6,1644; 106,8396"),
    col("Status Penggunaan", fields::STATUS_PENGGUNAAN, "Digunakan sendiri"),
    col("No Sertifikat", fields::NO_SERTIFIKAT, "09.05.01.01.1.00123"),
    col("Keterangan", fields::KETERANGAN, ""),
];

const BANGUNAN_COLUMNS: &[TemplateColumn] = &[
    col("Kode Barang", fields::KODE_BARANG, "4010101001"),
    col("NUP", fields::NUP, "3"),
    col("Nama Barang", fields::NAMA_BARANG, "Rumah Negara Golongan II"),
    col("Area", fields::AREA, "Komplek Perumahan Blok C"),
    col("Nama Penghuni", fields::OCCUPANT_NAME, "Mayor Laut (P) Andi"),
    col("Luas Bangunan", fields::LUAS_BANGUNAN, "120"),
    col("Luas Tanah Seluruhnya", fields::LUAS_TANAH_SELURUHNYA, "200"),
    col("Nilai Perolehan", fields::NILAI_PEROLEHAN, "450.000.000"),
    col("Tanggal Perolehan", fields::TANGGAL_PEROLEHAN, "2012-07-01"),
    col("Alamat", fields::ALAMAT, "Jl. Martadinata No. 10, Surabaya"),
    col("Koordinat", fields::KOORDINAT, "7°12'20.00\"S 112°44'10.00\"E"),
    col("Kondisi", fields::KONDISI, "Baik"),
    col("Status Penggunaan", fields::STATUS_PENGGUNAAN, "Dihuni"),
    col("Keterangan", fields::KETERANGAN, ""),
];

const KENDARAAN_COLUMNS: &[TemplateColumn] = &[
    col("Kode Barang", fields::KODE_BARANG, "3020101003"),
    col("NUP", fields::NUP, "12"),
    col("Nama Barang", fields::NAMA_BARANG, "Minibus"),
    col("Jenis BMN", fields::JENIS_BMN, "Alat Angkutan Darat"),
    col("No Polisi", "extra_no_polisi", "B 1234 TNI"),
    col("Merk / Tipe", "extra_merk_tipe", "Toyota Innova"),
    col("Nilai Perolehan", fields::NILAI_PEROLEHAN, "350.000.000"),
    col("Tanggal Perolehan", fields::TANGGAL_PEROLEHAN, "2019-01-15"),
    col("Kondisi", fields::KONDISI, "Baik"),
    col("Status Penggunaan", fields::STATUS_PENGGUNAAN, "Operasional"),
    col("Keterangan", fields::KETERANGAN, ""),
];

// Faskes / Harkan / Faslabuh / Faslan / Fasharpan 共用
const FACILITY_COLUMNS: &[TemplateColumn] = &[
    col("Kode Barang", fields::KODE_BARANG, "4010199999"),
    col("NUP", fields::NUP, "1"),
    col("Nama Barang", fields::NAMA_BARANG, "Dermaga Beton"),
    col("Jenis BMN", fields::JENIS_BMN, "Bangunan Air"),
    col("Luas Bangunan", fields::LUAS_BANGUNAN, "850,5"),
    col("Nilai Perolehan", fields::NILAI_PEROLEHAN, "12.000.000.000"),
    col("Tanggal Perolehan", fields::TANGGAL_PEROLEHAN, "2010-11-20"),
    col("Alamat", fields::ALAMAT, "Pangkalan Utama TNI AL"),
    col("Koordinat", fields::KOORDINAT, "-5.1234, 119.4123"),
    col("Kondisi", fields::KONDISI, "Rusak Ringan"),
    col("Keterangan", fields::KETERANGAN, ""),
];

/// 类别模板列
pub fn template_columns(category: AssetCategory) -> &'static [TemplateColumn] {
    match category {
        AssetCategory::Tanah => TANAH_COLUMNS,
        AssetCategory::Bangunan => BANGUNAN_COLUMNS,
        AssetCategory::Kendaraan => KENDARAAN_COLUMNS,
        AssetCategory::Faskes
        | AssetCategory::Harkan
        | AssetCategory::Faslabuh
        | AssetCategory::Faslan
        | AssetCategory::Fasharpan => FACILITY_COLUMNS,
    }
}

/// 示例行（与 template_columns 同序）
pub fn example_row(category: AssetCategory) -> Vec<&'static str> {
    template_columns(category).iter().map(|c| c.example).collect()
}

/// 模板文件名，例如 `template_import_tanah.csv`
pub fn template_file_name(category: AssetCategory) -> String {
    format!("template_import_{}.csv", category.slug())
}

/// 写出 CSV 模板（表头 + 一行示例）
pub fn write_template_csv<W: Write>(category: AssetCategory, writer: W) -> ImportResult<()> {
    let columns = template_columns(category);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(|c| c.header))?;
    csv_writer.write_record(columns.iter().map(|c| c.example))?;
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_mapper::map_column_to_field;

    #[test]
    fn test_headers_map_back_to_fields() {
        for category in AssetCategory::ALL {
            for column in template_columns(category) {
                assert_eq!(
                    map_column_to_field(column.header),
                    column.field,
                    "{} / {}",
                    category,
                    column.header
                );
            }
        }
    }

    #[test]
    fn test_examples_avoid_suspicious_item_codes() {
        for category in AssetCategory::ALL {
            let kode = template_columns(category)
                .iter()
                .find(|c| c.field == fields::KODE_BARANG)
                .map(|c| c.example)
                .unwrap();
            assert_ne!(kode.len(), 4);
        }
    }

    #[test]
    fn test_write_template_csv() {
        let mut buffer = Vec::new();
        write_template_csv(AssetCategory::Tanah, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Kode Barang,NUP,Nama Barang"));
        assert!(lines.next().unwrap().starts_with("2010101001,1,"));
        assert_eq!(template_file_name(AssetCategory::Faslabuh), "template_import_faslabuh.csv");
    }
}
