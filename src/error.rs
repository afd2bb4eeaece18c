//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// docxmergeクレート全体で使用するエラー型
///
/// このエラー型は、入力ファイルの検出、スプレッドシートの解析、
/// テンプレート文書の書き換え処理中に発生するすべてのエラーを
/// 統一的に扱うために使用されます。
///
/// # エラーの分類
///
/// - `MissingInput`: 致命的。テンプレートまたはスプレッドシートが1つも
///   見つからない場合に、出力ディレクトリを作成する前に発生します。
/// - `InvalidFormat`: スプレッドシート単位。ヘッダー行または有効な
///   データ行を持たないスプレッドシートはスキップされ、処理は継続します。
/// - その他のバリアント: （レコード × テンプレート）ペア単位で捕捉され、
///   `PairFailure`として集計されます。バッチ全体は停止しません。
///
/// # 使用例
///
/// ```rust,no_run
/// use docxmerge::DocxMergeError;
/// use std::fs::File;
///
/// fn open_template(path: &str) -> Result<(), DocxMergeError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DocxMergeError {
    /// I/O操作中に発生したエラー
    ///
    /// ファイルのコピー失敗、読み込み失敗、書き込み失敗など、標準ライブラリの
    /// `std::io::Error`が発生した場合に使用されます。
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー
    ///
    /// calamineクレートがExcelファイルを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    ///
    /// `#[from]`属性により、`calamine::Error`から自動的に変換されます。
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    ///
    /// XML解析時にUTF-8文字列への変換に失敗した場合に発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析・書き込みエラー
    ///
    /// テンプレート文書（DOCXはZIPアーカイブ）の読み書き中に発生した
    /// エラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XMLの解析・生成エラー
    ///
    /// 文書パート（document.xml、ヘッダー、フッター）の読み書き中に
    /// 発生したエラーです。
    #[error("XML error: {0}")]
    Xml(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `MergerBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、出力ディレクトリ名が空の場合や、
    /// プレースホルダー書式が1つも指定されていない場合などです。
    ///
    /// # 例
    ///
    /// ```rust
    /// use docxmerge::{DocxMergeError, MergerBuilder};
    ///
    /// let result = MergerBuilder::new()
    ///     .with_output_dir("")  // 無効なディレクトリ名
    ///     .build();
    ///
    /// match result {
    ///     Err(DocxMergeError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 必要な入力ファイルが見つからないエラー
    ///
    /// 対象ディレクトリに.docxテンプレートまたは.xlsxスプレッドシートが
    /// 1つも存在しない場合に発生します。このエラーのみが実行全体を
    /// 中断し、出力ディレクトリが作成される前に報告されます。
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// スプレッドシートの形式が不正なエラー
    ///
    /// ヘッダー行が存在しない、またはキー列（1列目）が埋まった
    /// データ行が1つも存在しない場合に発生します。該当する
    /// スプレッドシートのみがスキップされ、残りの処理は継続します。
    #[error("Invalid spreadsheet format in '{file}': {message}")]
    InvalidFormat {
        /// エラーが発生したスプレッドシートのファイル名
        file: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。出力ファイル名を
    /// ディレクトリ外へ逃がすレコードキーもこの扱いになります。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
