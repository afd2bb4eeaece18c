//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::Serialize;

/// スプレッドシートのヘッダー行（列位置 → フィールド名）
///
/// 先頭シートの1行目から一度だけ導出されます。空のヘッダーセルは
/// 含まれません。列位置は絶対列インデックス（0始まり）です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHeader {
    /// (絶対列インデックス, フィールド名) のリスト（列順）
    columns: Vec<(u32, String)>,
}

impl FieldHeader {
    /// 新しいヘッダーを生成
    pub(crate) fn new(columns: Vec<(u32, String)>) -> Self {
        Self { columns }
    }

    /// ヘッダー列の数を取得
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// ヘッダーが空かどうかを判定
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// (絶対列インデックス, フィールド名) のスライスを取得
    pub fn columns(&self) -> &[(u32, String)] {
        &self.columns
    }

    /// フィールド名のイテレーターを取得（列順）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, name)| name.as_str())
    }
}

/// スプレッドシートの1データ行
///
/// フィールド名 → 値の順序付きマッピングと、出力ファイル名に使用される
/// キー値（1列目のセル値、前後空白除去済み）を保持します。
/// ヘッダーを持ち、かつ値が空でないセルのみがフィールドに含まれます。
/// 解析後は不変です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 出力ファイル名に使用されるキー値（1列目）
    key: String,
    /// (フィールド名, 値) のリスト（ヘッダー列順）
    fields: Vec<(String, String)>,
}

impl Record {
    /// 新しいレコードを生成
    pub(crate) fn new(key: String, fields: Vec<(String, String)>) -> Self {
        Self { key, fields }
    }

    /// キー値を取得
    pub fn key(&self) -> &str {
        &self.key
    }

    /// (フィールド名, 値) のスライスを取得（ヘッダー列順）
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// フィールド名で値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// 1つのスプレッドシートの解析結果
///
/// ヘッダーと、行順に並んだレコード列を保持します。
#[derive(Debug, Clone)]
pub struct RecordSet {
    /// 解析元のファイル名（レポート用のラベル）
    source: String,
    /// ヘッダー行
    header: FieldHeader,
    /// データ行のレコード（行順）
    records: Vec<Record>,
}

impl RecordSet {
    /// 新しいレコードセットを生成
    pub(crate) fn new(source: String, header: FieldHeader, records: Vec<Record>) -> Self {
        Self {
            source,
            header,
            records,
        }
    }

    /// 解析元のファイル名を取得
    pub fn source(&self) -> &str {
        &self.source
    }

    /// ヘッダーを取得
    pub fn header(&self) -> &FieldHeader {
        &self.header
    }

    /// レコードのスライスを取得（行順）
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

/// 1つの（レコード × テンプレート）ペアの処理失敗
///
/// ペア単位の失敗は他のペアの処理に影響しません。部分的に書かれた
/// 出力ファイルは削除済みです。
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    /// レコードの由来となったスプレッドシートのファイル名
    pub spreadsheet: String,
    /// レコードのキー値
    pub record_key: String,
    /// テンプレートのファイル名
    pub template: String,
    /// 失敗理由（エラーメッセージ）
    pub reason: String,
}

/// スキップされたスプレッドシート
///
/// ヘッダー行や有効なデータ行を持たないスプレッドシートは、
/// このレコードを残して処理から除外されます。
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSpreadsheet {
    /// スキップされたスプレッドシートのファイル名
    pub spreadsheet: String,
    /// スキップ理由（エラーメッセージ）
    pub reason: String,
}

/// バッチ処理全体の結果レポート
///
/// すべてのスプレッドシートとテンプレートにまたがって集計されます。
///
/// # 使用例
///
/// ```rust,no_run
/// use docxmerge::MergerBuilder;
///
/// # fn main() -> Result<(), docxmerge::DocxMergeError> {
/// let merger = MergerBuilder::new().build()?;
/// let report = merger.merge_directory(".")?;
///
/// println!("Generated {} document(s)", report.success_count());
/// for name in &report.produced {
///     println!("  {}", name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// 生成に成功した出力ファイル名のリスト（生成順）
    pub produced: Vec<String>,
    /// ペア単位の失敗のリスト
    pub failures: Vec<PairFailure>,
    /// スキップされたスプレッドシートのリスト
    pub skipped: Vec<SkippedSpreadsheet>,
}

impl MergeReport {
    /// 生成に成功した文書の数を取得
    pub fn success_count(&self) -> usize {
        self.produced.len()
    }

    /// 1つ以上の文書が生成されたかどうかを判定
    pub fn is_success(&self) -> bool {
        !self.produced.is_empty()
    }
}
