// ==========================================
// 订单运营后台 - CSV 文件解析器
// ==========================================
// 阶段 0: 文件读取(存在性/权限/UTF-8)与解析
// 阶段 1: 表头结构校验(必需列)
// 红线: 以上任一失败即终止,不处理任何数据行
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_row::RawRow;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// 已解析的 CSV 数据源
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvSource {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl CsvSource {
    /// 校验表头是否包含全部必需列
    ///
    /// # 返回
    /// - Ok(()): 全部存在
    /// - Err(EmptyFile): 无表头
    /// - Err(MissingColumns): 缺列(按字母序列出)
    pub fn check_required_columns(&self, required: &[&str]) -> ImportResult<()> {
        if self.headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        let declared: HashSet<&str> = self.headers.iter().map(String::as_str).collect();
        let mut missing: Vec<String> = required
            .iter()
            .filter(|col| !declared.contains(**col))
            .map(|col| col.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        missing.sort();
        Err(ImportError::MissingColumns {
            missing,
            required: required.iter().map(|c| c.to_string()).collect(),
        })
    }
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 读取并解析 CSV 文件
    pub fn parse_file(&self, file_path: &Path) -> ImportResult<CsvSource> {
        let path_str = file_path.display().to_string();

        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(path_str));
        }

        let bytes = std::fs::read(file_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ImportError::FileNotFound(path_str.clone()),
            ErrorKind::PermissionDenied => ImportError::PermissionDenied(path_str.clone()),
            _ => ImportError::FileReadError(format!("{}: {}", path_str, e)),
        })?;

        let content = String::from_utf8(bytes).map_err(|e| ImportError::EncodingError {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        self.parse_str(&content)
    }

    /// 解析内存中的 CSV 文本(第一行为表头)
    pub fn parse_str(&self, content: &str) -> ImportResult<CsvSource> {
        // 去掉 UTF-8 BOM
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致,缺失单元格按空处理
            .from_reader(content.as_bytes());

        // 读取表头(列名按原样比较,不做 trim)
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let mut row = RawRow::new(line);
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.fields.insert(header.clone(), value.to_string());
                }
            }
            rows.push(row);
        }

        debug!(columns = headers.len(), rows = rows.len(), "CSV 解析完成");
        Ok(CsvSource { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::import_row::REQUIRED_COLUMNS;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_parser_valid_file() {
        // 创建临时 CSV 文件
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "order_id,product_ids").unwrap();
        writeln!(temp_file, "ORD1,\"[\"\"A1\"\",\"\"B2\"\"]\"").unwrap();
        writeln!(temp_file, "ORD2,[]").unwrap();

        let source = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(source.headers, vec!["order_id", "product_ids"]);
        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.rows[0].line, 2);
        assert_eq!(source.rows[0].get("product_ids"), Some(r#"["A1","B2"]"#));
        assert_eq!(source.rows[1].line, 3);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_file(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_rejects_non_utf8() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"order_id\n\xff\xfeORD1\n").unwrap();

        let result = CsvParser.parse_file(temp_file.path());
        assert!(matches!(result, Err(ImportError::EncodingError { .. })));
    }

    #[test]
    fn test_short_rows_leave_cells_absent() {
        let source = CsvParser.parse_str("a,b,c\n1\n").unwrap();
        assert_eq!(source.rows[0].get("a"), Some("1"));
        assert_eq!(source.rows[0].get("c"), None);
    }

    #[test]
    fn test_strips_bom_from_header() {
        let source = CsvParser.parse_str("\u{feff}client_email,x\n").unwrap();
        assert_eq!(source.headers[0], "client_email");
    }

    #[test]
    fn test_padded_header_name_is_not_required_column() {
        let header = REQUIRED_COLUMNS.join(",").replacen("client_email", " client_email", 1);
        let source = CsvParser.parse_str(&format!("{}\n", header)).unwrap();
        assert_eq!(source.headers[0], " client_email");

        match source.check_required_columns(&REQUIRED_COLUMNS) {
            Err(ImportError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["client_email".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_check_required_columns() {
        let header = REQUIRED_COLUMNS.join(",");
        let source = CsvParser.parse_str(&format!("{}\n", header)).unwrap();
        assert!(source.check_required_columns(&REQUIRED_COLUMNS).is_ok());

        let source = CsvParser
            .parse_str("client_email,order_id,product_ids\n")
            .unwrap();
        match source.check_required_columns(&REQUIRED_COLUMNS) {
            Err(ImportError::MissingColumns { missing, required }) => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"client_shop".to_string()));
                assert_eq!(required.len(), 10);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_empty_file() {
        let source = CsvParser.parse_str("").unwrap();
        assert!(matches!(
            source.check_required_columns(&REQUIRED_COLUMNS),
            Err(ImportError::EmptyFile)
        ));
    }
}
