//! RecordSource Module
//!
//! calamineを使用したスプレッドシート解析の実装。
//! 先頭シートの1行目をヘッダーとして読み取り、キー列（1列目）が
//! 埋まった各行を1つのレコードとして抽出します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::DocxMergeError;
use crate::security::{self, SecurityConfig};
use crate::types::{FieldHeader, Record, RecordSet};

/// スプレッドシートファイルを解析してレコードセットを生成
///
/// # 引数
///
/// * `path` - スプレッドシートファイルのパス
///
/// # 戻り値
///
/// * `Ok(RecordSet)` - ヘッダーと1件以上のレコードの抽出に成功した場合
/// * `Err(DocxMergeError)` - 解析エラー、またはヘッダー行/データ行が
///   存在しない場合（`InvalidFormat`）
pub fn load_records(path: impl AsRef<Path>) -> Result<RecordSet, DocxMergeError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_records(file, &source_name)
}

/// リーダーからスプレッドシートを解析してレコードセットを生成
///
/// # 引数
///
/// * `reader` - スプレッドシートを読み込むためのリーダー（Read + Seekトレイトを実装）
/// * `source_name` - レポートとエラーメッセージに使用するファイル名ラベル
///
/// # 戻り値
///
/// * `Ok(RecordSet)` - 抽出に成功した場合
/// * `Err(DocxMergeError)` - エラーが発生した場合
///
/// # 処理フロー
///
/// 1. 入力全体をメモリに読み込む（サイズ制限を適用）
/// 2. calamineでワークブックを開く（XLSX形式のみサポート）
/// 3. 先頭シートの1行目からヘッダーを解析
/// 4. 2行目以降からデータ行を抽出
pub fn parse_records<R: Read + Seek>(
    mut reader: R,
    source_name: &str,
) -> Result<RecordSet, DocxMergeError> {
    // 1. 入力データをメモリに読み込む
    // セキュリティ: ファイルサイズ制限を適用
    let security_config = SecurityConfig::default();
    let mut buffer = Vec::new();
    let bytes_read = reader.read_to_end(&mut buffer)?;
    security::validate_input_size(bytes_read as u64, &security_config)?;

    // 2. calamineでワークブックを開く
    let sheets = open_workbook_auto_from_rs(Cursor::new(buffer)).map_err(DocxMergeError::Parse)?;
    let mut workbook = match sheets {
        Sheets::Xlsx(workbook) => workbook,
        _ => {
            return Err(DocxMergeError::Config(
                "Only XLSX format is supported".to_string(),
            ))
        }
    };

    // 3. 先頭シートの取得
    // calamineはワークブックのアクティブタブを公開しないため、
    // 先頭シートを対象とする
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DocxMergeError::InvalidFormat {
            file: source_name.to_string(),
            message: "Workbook contains no sheets".to_string(),
        })?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DocxMergeError::Parse(e.into()))?;

    // 4. ヘッダー行の解析
    let header = parse_header(&range, source_name)?;

    // 5. データ行の抽出
    let records = collect_records(&range, &header)?;
    if records.is_empty() {
        return Err(DocxMergeError::InvalidFormat {
            file: source_name.to_string(),
            message: "No valid data rows found (key column is empty)".to_string(),
        });
    }

    Ok(RecordSet::new(source_name.to_string(), header, records))
}

/// 絶対行1からヘッダーを解析
///
/// 空でないヘッダーセルのみを取り込みます。使用範囲が行1から
/// 始まらない場合、行1にヘッダーは存在しないため`InvalidFormat`です。
fn parse_header(range: &Range<Data>, source_name: &str) -> Result<FieldHeader, DocxMergeError> {
    let (start_row, start_col) = range.start().ok_or_else(|| DocxMergeError::InvalidFormat {
        file: source_name.to_string(),
        message: "Sheet is empty".to_string(),
    })?;

    if start_row > 0 {
        return Err(DocxMergeError::InvalidFormat {
            file: source_name.to_string(),
            message: "No header row found (row 1 is empty)".to_string(),
        });
    }

    let mut columns = Vec::new();
    if let Some(first_row) = range.rows().next() {
        for (offset, cell) in first_row.iter().enumerate() {
            let text = cell_to_string(cell)?;
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                columns.push((start_col + offset as u32, trimmed.to_string()));
            }
        }
    }

    if columns.is_empty() {
        return Err(DocxMergeError::InvalidFormat {
            file: source_name.to_string(),
            message: "No header cells found in the first row".to_string(),
        });
    }

    Ok(FieldHeader::new(columns))
}

/// 2行目以降からデータ行を抽出
///
/// キー列（絶対列1）が空の行はデータ行として数えず、スキップします。
/// 各レコードには、ヘッダーを持ち、かつ値が空でないセルのみが
/// 含まれます。
fn collect_records(
    range: &Range<Data>,
    header: &FieldHeader,
) -> Result<Vec<Record>, DocxMergeError> {
    // parse_headerの検証により、使用範囲は行1から始まる
    let start_col = range.start().map(|(_, col)| col).unwrap_or(0);

    let mut records = Vec::new();
    for row in range.rows().skip(1) {
        // キー列は絶対列1。使用範囲が列1を含まない場合、キー列は常に空
        let key = if start_col == 0 {
            match row.first() {
                Some(cell) => cell_to_string(cell)?.trim().to_string(),
                None => String::new(),
            }
        } else {
            String::new()
        };
        if key.is_empty() {
            continue;
        }

        let mut fields = Vec::new();
        for (col, name) in header.columns() {
            let idx = (col - start_col) as usize;
            if let Some(cell) = row.get(idx) {
                let value = cell_to_string(cell)?;
                if !value.is_empty() {
                    fields.push((name.clone(), value));
                }
            }
        }
        records.push(Record::new(key, fields));
    }

    Ok(records)
}

/// セル値を差し込み用の文字列に変換
///
/// # 変換規則
///
/// - 文字列: そのまま
/// - 整数値の浮動小数点数: 小数点なし（`42.0` → `"42"`）
/// - 日付・日時: ISO 8601形式（時刻部がない場合は日付のみ）
/// - 論理値: `true` / `false`
/// - エラーセル: エラー種別のデバッグ表現
/// - 空セル: 空文字列（呼び出し側でフィールドから除外される）
fn cell_to_string(cell: &Data) -> Result<String, DocxMergeError> {
    let text = match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_serial_datetime(dt.as_f64())?,
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    };
    Ok(text)
}

/// 浮動小数点数を文字列に変換（整数値は小数点なし）
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Excelのシリアル日付値をISO 8601形式の文字列に変換
///
/// 1900年システム（1899年12月30日起算）として処理します。
/// シリアル値に時刻部（小数部）がある場合は日時、ない場合は日付のみを
/// 出力します。
fn format_serial_datetime(serial: f64) -> Result<String, DocxMergeError> {
    // 1900年システム: 1899年12月30日起算
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| DocxMergeError::Config("Invalid epoch date".to_string()))?;

    let mut days = serial.floor() as i64;
    let frac = serial - serial.floor();
    let mut seconds = (frac * 86_400.0).round() as i64;
    // 丸めにより時刻が24:00:00になった場合は翌日に繰り上げる
    if seconds >= 86_400 {
        days += 1;
        seconds = 0;
    }

    let date = epoch.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        DocxMergeError::Config(format!("Date calculation overflow: serial_value={}", serial))
    })?;

    if seconds == 0 {
        Ok(date.format("%Y-%m-%d").to_string())
    } else {
        let time = chrono::NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, 0)
            .ok_or_else(|| {
                DocxMergeError::Config(format!("Invalid time of day: serial_value={}", serial))
            })?;
        Ok(date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 実際のXLSXファイルを必要とするテストは統合テスト（tests/）で
    // 実装します。ここではセル値の変換のみを検証します。

    #[test]
    fn test_format_float_integral() {
        assert_eq!(format_float(42.0), "42");
        assert_eq!(format_float(-3.0), "-3");
        assert_eq!(format_float(0.0), "0");
    }

    #[test]
    fn test_format_float_fractional() {
        assert_eq!(format_float(3.5), "3.5");
        assert_eq!(format_float(-0.25), "-0.25");
    }

    #[test]
    fn test_format_serial_date_only() {
        // シリアル値2 = 1900-01-01
        assert_eq!(format_serial_datetime(2.0).unwrap(), "1900-01-01");
        // シリアル値45658 = 2025-01-01
        assert_eq!(format_serial_datetime(45_658.0).unwrap(), "2025-01-01");
    }

    #[test]
    fn test_format_serial_with_time() {
        // 0.5 = 12:00:00
        assert_eq!(
            format_serial_datetime(45_658.5).unwrap(),
            "2025-01-01 12:00:00"
        );
    }

    #[test]
    fn test_cell_to_string_basic() {
        assert_eq!(cell_to_string(&Data::Empty).unwrap(), "");
        assert_eq!(
            cell_to_string(&Data::String("Alice".to_string())).unwrap(),
            "Alice"
        );
        assert_eq!(cell_to_string(&Data::Int(7)).unwrap(), "7");
        assert_eq!(cell_to_string(&Data::Float(7.5)).unwrap(), "7.5");
        assert_eq!(cell_to_string(&Data::Bool(true)).unwrap(), "true");
    }
}
