use crate::core::field_parsers::{normalize_phone, parse_date, split_csv_line};
use crate::domain::model::{ContactRecord, ParseReport, RowError};
use crate::utils::error::{CardError, Result};
use std::collections::HashMap;

pub const REQUIRED_HEADERS: [&str; 6] = ["name", "gender", "dateofbirth", "email", "phone", "address"];

/// 表頭名稱 (小寫) 對應到欄位索引
struct HeaderMap {
    columns: HashMap<String, usize>,
    width: usize,
}

impl HeaderMap {
    fn from_line(line: &str) -> Self {
        let headers = split_csv_line(line);
        let width = headers.len();
        let mut columns = HashMap::new();
        for (index, header) in headers.into_iter().enumerate() {
            // 重複的表頭以第一個為準
            columns.entry(header.trim().to_lowercase()).or_insert(index);
        }
        Self { columns, width }
    }

    fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|header| !self.columns.contains_key(*header))
            .collect()
    }

    fn value<'a>(&self, fields: &'a [String], header: &str) -> &'a str {
        self.columns
            .get(header)
            .and_then(|&index| fields.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    }
}

/// 解析整份 CSV 內容
///
/// 表頭有問題時只回報結構性錯誤；之後每一列各自成功或失敗，互不影響。
pub fn parse_csv(content: &str) -> ParseReport {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return ParseReport::structural(
            "CSV file must contain a header row and at least one data row",
        );
    }

    let header = HeaderMap::from_line(lines[0]);
    let missing = header.missing_required();
    if !missing.is_empty() {
        tracing::warn!("❌ CSV header is missing required columns: {:?}", missing);
        return ParseReport {
            structural_errors: missing
                .into_iter()
                .map(|name| format!("Missing required header: {}", name))
                .collect(),
            ..ParseReport::default()
        };
    }

    let mut report = ParseReport::default();
    for (index, line) in lines.iter().enumerate().skip(1) {
        let row_number = index + 1;
        match parse_row(&header, line) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                tracing::debug!("Row {} rejected: {}", row_number, e);
                report.row_errors.push(RowError {
                    label: "Row",
                    position: row_number,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        "Parsed CSV: {} records, {} row errors",
        report.records.len(),
        report.row_errors.len()
    );
    report
}

fn parse_row(header: &HeaderMap, line: &str) -> Result<ContactRecord> {
    let fields = split_csv_line(line);
    if fields.len() != header.width {
        return Err(CardError::structural(format!(
            "column count mismatch (expected {}, found {})",
            header.width,
            fields.len()
        )));
    }

    let image = header.value(&fields, "image");

    Ok(ContactRecord {
        name: header.value(&fields, "name").to_string(),
        gender: header.value(&fields, "gender").to_string(),
        date_of_birth: parse_date(header.value(&fields, "dateofbirth"))?,
        email: header.value(&fields, "email").to_string(),
        phone: normalize_phone(header.value(&fields, "phone")),
        image: (!image.is_empty()).then(|| image.to_string()),
        address: header.value(&fields, "address").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "Name,Gender,DateOfBirth,Email,Phone,Address";

    #[test]
    fn test_parse_valid_rows() {
        let content = format!(
            "{}\nJane Doe,Female,1990-04-12,jane@example.com,0912345678,1 Main St\nJohn Roe,Male,3/5/1985,john@example.com,0987654321,2 Side Rd\n",
            HEADER
        );

        let report = parse_csv(&content);

        assert!(report.structural_errors.is_empty());
        assert!(report.row_errors.is_empty());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].name, "Jane Doe");
        assert_eq!(
            report.records[1].date_of_birth,
            NaiveDate::from_ymd_opt(1985, 3, 5).unwrap()
        );
        assert_eq!(report.records[0].image, None);
    }

    #[test]
    fn test_headers_are_case_insensitive_and_trimmed() {
        let content = " NAME , gender,DATEOFBIRTH,Email,PHONE,address,Image\r\nJane,F,2000-01-01,j@x.io,123,Addr,data:image/png;base64\r\n";

        let report = parse_csv(content);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].address, "Addr");
        assert_eq!(report.records[0].image.as_deref(), Some("data:image/png;base64"));
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let content = format!("\n{}\n\n   \nJane,F,2000-01-01,j@x.io,123,Addr\n\n", HEADER);

        let report = parse_csv(&content);

        assert_eq!(report.records.len(), 1);
        assert!(report.row_errors.is_empty());
    }

    #[test]
    fn test_header_only_is_structural_error() {
        let report = parse_csv(HEADER);

        assert!(report.records.is_empty());
        assert_eq!(report.structural_errors.len(), 1);
    }

    #[test]
    fn test_missing_headers_abort_before_rows() {
        let content = "Name,Gender,Email,Phone\nJane,F,j@x.io,123\n";

        let report = parse_csv(content);

        assert!(report.records.is_empty());
        assert!(report.row_errors.is_empty());
        assert_eq!(
            report.structural_errors,
            vec![
                "Missing required header: dateofbirth".to_string(),
                "Missing required header: address".to_string()
            ]
        );
    }

    #[test]
    fn test_column_count_mismatch_skips_row() {
        let content = format!(
            "{}\nJane,F,2000-01-01,j@x.io,123\nJohn,M,2000-01-02,k@x.io,456,Addr\n",
            HEADER
        );

        let report = parse_csv(&content);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].name, "John");
        assert_eq!(report.row_errors.len(), 1);
        assert_eq!(report.row_errors[0].position, 2);
        assert!(report.row_errors[0].to_string().contains("column count mismatch"));
    }

    #[test]
    fn test_bad_date_does_not_stop_later_rows() {
        let content = format!(
            "{}\nJane,F,notadate,j@x.io,123,Addr\nJohn,M,2000-01-02,k@x.io,456,Addr\n",
            HEADER
        );

        let report = parse_csv(&content);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.row_errors.len(), 1);
        assert!(report.row_errors[0].to_string().starts_with("Row 2:"));
        assert!(report.row_errors[0].to_string().contains("notadate"));
    }

    #[test]
    fn test_phone_in_scientific_notation_is_recovered() {
        let content = format!("{}\nJane,F,2000-01-01,j@x.io,1.234567E+9,Addr\n", HEADER);

        let report = parse_csv(&content);

        assert_eq!(report.records[0].phone, "1234567000");
    }

    #[test]
    fn test_quoted_address_keeps_comma() {
        let content = format!(
            "{}\nJane,F,2000-01-01,j@x.io,123,\"123 Main, Apt 4\"\n",
            HEADER
        );

        let report = parse_csv(&content);

        assert_eq!(report.records[0].address, "123 Main, Apt 4");
    }
}
