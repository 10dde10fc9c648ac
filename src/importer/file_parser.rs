// ==========================================
// BMN 资产台账 - 文件解析器实现
// ==========================================
// 职责: 文件 → 单元格网格 → 表头识别 → 原始行
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls) / ODS (.ods) / CSV (.csv，自动识别 , 或 ;)
// 表头: 前 N 行内首个含关键词的行；之前的行视为标题区跳过
// ==========================================

use crate::domain::asset::{CellValue, RawRow};
use crate::importer::asset_importer_trait::FileParser;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 默认表头扫描行数
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 20;

/// 默认表头关键词
pub const DEFAULT_HEADER_KEYWORDS: &[&str] = &["nama", "kode", "urut", "nup", "no"];

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub header_row: usize, // 表头在网格中的位置（0 起）
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    sniff_lines: usize, // 分隔符识别扫描的非空行数
}

impl CsvParser {
    pub fn new(sniff_lines: usize) -> Self {
        Self {
            sniff_lines: sniff_lines.max(1),
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_SCAN_ROWS)
    }
}

impl FileParser for CsvParser {
    fn read_grid(&self, file_path: &Path) -> ImportResult<Vec<Vec<CellValue>>> {
        ensure_exists(file_path)?;
        if extension_of(file_path) != "csv" {
            return Err(ImportError::UnsupportedFormat(extension_of(file_path)));
        }

        let content = fs::read_to_string(file_path)?;
        let content = content.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(content, self.sniff_lines);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(record.iter().map(CellValue::from).collect());
        }

        Ok(grid)
    }
}

/// 分隔符识别（印尼区域设置的 Excel 导出多为分号）
///
/// 在前 sniff_lines 个非空行中取分隔符最多的一行（通常是表头），
/// 该行分号多于逗号时按分号分隔；引号内的字符不计数
fn sniff_delimiter(content: &str, sniff_lines: usize) -> u8 {
    let (semicolons, commas) = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(sniff_lines)
        .map(|line| {
            (
                count_unquoted(line, ';'),
                count_unquoted(line, ','),
            )
        })
        .fold((0, 0), |best, counts| {
            if counts.0.max(counts.1) > best.0.max(best.1) {
                counts
            } else {
                best
            }
        });

    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn count_unquoted(line: &str, separator: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            count += 1;
        }
    }
    count
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn read_grid(&self, file_path: &Path) -> ImportResult<Vec<Vec<CellValue>>> {
        ensure_exists(file_path)?;
        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        Ok(range
            .rows()
            .map(|row| row.iter().map(data_to_cell).collect())
            .collect())
    }
}

fn data_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::Text(value.format("%Y-%m-%d").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    header_scan_rows: usize,
    header_keywords: Vec<String>,
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(
            DEFAULT_HEADER_SCAN_ROWS,
            DEFAULT_HEADER_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        )
    }
}

impl FileParser for UniversalFileParser {
    fn read_grid(&self, file_path: &Path) -> ImportResult<Vec<Vec<CellValue>>> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => CsvParser::new(self.header_scan_rows).read_grid(file_path),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelParser.read_grid(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

impl UniversalFileParser {
    pub fn new(header_scan_rows: usize, header_keywords: Vec<String>) -> Self {
        Self {
            header_scan_rows,
            header_keywords: header_keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// 读取文件并切分表头与数据行
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 表头 + 数据行（表内空白行保留，按位置编号）
    /// - Err(EmptySheet): 网格中没有任何非空单元格
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedSheet> {
        let path = file_path.as_ref();
        let grid = self.read_grid(path)?;
        let keywords: Vec<&str> = self.header_keywords.iter().map(String::as_str).collect();

        let header_row = detect_header_row(&grid, self.header_scan_rows, &keywords)
            .ok_or_else(|| ImportError::EmptySheet(path.display().to_string()))?;

        let headers: Vec<String> = grid[header_row]
            .iter()
            .map(|cell| cell.as_text().unwrap_or_default())
            .collect();

        let rows: Vec<RawRow> = grid
            .into_iter()
            .skip(header_row + 1)
            .enumerate()
            .map(|(index, cells)| RawRow::new(index, cells))
            .collect();

        debug!(
            file = %path.display(),
            header_row,
            columns = headers.len(),
            rows = rows.len(),
            "表格解析完成"
        );

        Ok(ParsedSheet {
            headers,
            rows,
            header_row,
        })
    }
}

/// 表头行识别
///
/// # 规则
/// 1. 前 scan_rows 行中，首个至少两个非空单元格且含关键词（按词匹配）的行
/// 2. 否则取首个非空行
/// 3. 全表为空 → None
pub fn detect_header_row(
    grid: &[Vec<CellValue>],
    scan_rows: usize,
    keywords: &[&str],
) -> Option<usize> {
    let looks_like_header = |row: &Vec<CellValue>| {
        let texts: Vec<String> = row.iter().filter_map(|c| c.as_text()).collect();
        texts.len() >= 2
            && texts.iter().any(|text| {
                text.to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|token| keywords.contains(&token))
            })
    };

    grid.iter()
        .take(scan_rows)
        .position(looks_like_header)
        .or_else(|| grid.iter().position(|row| row.iter().any(|c| !c.is_blank())))
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_with_preamble() {
        let file = csv_file(
            "DAFTAR BARANG MILIK NEGARA,,\n\
             Lantamal III,,\n\
             Nama,Kode Barang,NUP\n\
             Tanah A,T-01,1\n\
             Tanah B,T-02,2\n",
        );

        let sheet = UniversalFileParser::default().parse(file.path()).unwrap();

        assert_eq!(sheet.header_row, 2);
        assert_eq!(sheet.headers, vec!["Nama", "Kode Barang", "NUP"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].index, 0);
        assert_eq!(sheet.rows[1].cell(1), &CellValue::Text("T-02".to_string()));
    }

    #[test]
    fn test_csv_semicolon_and_blank_rows() {
        let file = csv_file("Nama;Kode Barang;Luas\nTanah A;T-01;1.500,00\n;;\nTanah C;T-03;10\n");

        let sheet = UniversalFileParser::default().parse(file.path()).unwrap();

        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[1].cells.iter().all(|c| c.is_blank()));
        assert_eq!(sheet.rows[0].cell(2), &CellValue::Text("1.500,00".to_string()));
    }

    #[test]
    fn test_semicolon_csv_behind_bare_title_line() {
        let file = csv_file(
            "LAPORAN BMN TANAH\n\
             Satuan Kerja: Lantamal III, Surabaya\n\
             No;Kode Barang;NUP;Nama Barang;Luas\n\
             1;2010101001;1;Tanah A;\"1.500,00\"\n\
             2;2010101001;2;Tanah B;750\n",
        );

        let sheet = UniversalFileParser::default().parse(file.path()).unwrap();

        assert_eq!(sheet.header_row, 2);
        assert_eq!(sheet.headers.len(), 5);
        assert_eq!(sheet.headers[1], "Kode Barang");
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].cell(4), &CellValue::Text("1.500,00".to_string()));
    }

    #[test]
    fn test_sniff_delimiter_uses_widest_line() {
        assert_eq!(sniff_delimiter("Judul\nA;B;C\n1;2;3\n", 20), b';');
        assert_eq!(sniff_delimiter("Judul; versi 2\nA,B,C\n", 20), b',');
        // 引号内的逗号不计
        assert_eq!(sniff_delimiter("A;B\n\"1,5\";\"2,5\"\n", 20), b';');
        assert_eq!(sniff_delimiter("", 20), b',');
        // 超出扫描窗口的行不参与
        assert_eq!(sniff_delimiter("Judul\nA;B;C\n", 1), b',');
    }

    #[test]
    fn test_detect_header_fallback_to_first_non_empty() {
        let grid = vec![
            vec![CellValue::Empty, CellValue::Empty],
            vec![CellValue::from("Merk"), CellValue::from("Tahun")],
            vec![CellValue::from("Toyota"), CellValue::from("2019")],
        ];
        assert_eq!(detect_header_row(&grid, 20, DEFAULT_HEADER_KEYWORDS), Some(1));
    }

    #[test]
    fn test_detect_header_ignores_single_cell_title() {
        let grid = vec![
            vec![CellValue::from("Daftar Nama Aset"), CellValue::Empty],
            vec![CellValue::from("No"), CellValue::from("Uraian")],
        ];
        assert_eq!(detect_header_row(&grid, 20, DEFAULT_HEADER_KEYWORDS), Some(1));
    }

    #[test]
    fn test_empty_grid_has_no_header() {
        let grid: Vec<Vec<CellValue>> = vec![vec![CellValue::Empty]];
        assert_eq!(detect_header_row(&grid, 20, DEFAULT_HEADER_KEYWORDS), None);
    }

    #[test]
    fn test_file_not_found() {
        let result = UniversalFileParser::default().parse("non_existent.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let file = Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = UniversalFileParser::default().parse(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
