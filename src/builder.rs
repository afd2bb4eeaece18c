//! Builder Module
//!
//! Fluent Builder APIを提供し、`Merger`インスタンスを段階的に構築する。
//! `Merger`は入力ファイルの検出から（レコード × テンプレート）ペアの
//! 逐次処理、結果レポートの集計までを担うオーケストレーターです。

use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::PlaceholderStyle;
use crate::document::DocxPackage;
use crate::error::DocxMergeError;
use crate::placeholder;
use crate::records;
use crate::types::{MergeReport, PairFailure, Record, SkippedSpreadsheet};

/// 差し込み処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct MergeConfig {
    /// 出力ディレクトリ名（対象ディレクトリ直下に作成される）
    pub output_dir: String,

    /// 生成するプレースホルダー書式
    pub styles: Vec<PlaceholderStyle>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_dir: "generated".to_string(),
            styles: PlaceholderStyle::ALL.to_vec(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Merger`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみを
/// オーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use docxmerge::{MergerBuilder, PlaceholderStyle};
///
/// # fn main() -> Result<(), docxmerge::DocxMergeError> {
/// let merger = MergerBuilder::new()
///     .with_output_dir("out")
///     .with_placeholder_styles(vec![PlaceholderStyle::CurlySingle])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MergerBuilder {
    /// 内部設定（構築中）
    config: MergeConfig,
}

impl Default for MergerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MergerBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 出力ディレクトリ名: `generated`
    /// - プレースホルダー書式: すべて（`{f}`、`{{f}}`、`[f]`、`<f>`）
    pub fn new() -> Self {
        Self {
            config: MergeConfig::default(),
        }
    }

    /// 出力ディレクトリ名を指定する
    ///
    /// 対象ディレクトリ直下にこの名前のディレクトリが作成されます。
    /// パス区切りを含む名前は`build()`で拒否されます。
    ///
    /// # 引数
    ///
    /// * `name`: 出力ディレクトリ名
    pub fn with_output_dir(mut self, name: impl Into<String>) -> Self {
        self.config.output_dir = name.into();
        self
    }

    /// 生成するプレースホルダー書式を指定する
    ///
    /// # 引数
    ///
    /// * `styles`: プレースホルダー書式のリスト（空のリストは
    ///   `build()`で拒否されます）
    pub fn with_placeholder_styles(mut self, styles: Vec<PlaceholderStyle>) -> Self {
        self.config.styles = styles;
        self
    }

    /// 設定を検証して`Merger`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Merger)` - 設定が有効な場合
    /// * `Err(DocxMergeError::Config)` - 無効な設定が検出された場合
    pub fn build(self) -> Result<Merger, DocxMergeError> {
        let mut config = self.config;

        // 出力ディレクトリ名の検証
        if config.output_dir.is_empty() {
            return Err(DocxMergeError::Config(
                "Output directory name must not be empty".to_string(),
            ));
        }
        if config.output_dir.contains('/')
            || config.output_dir.contains('\\')
            || config.output_dir == "."
            || config.output_dir == ".."
        {
            return Err(DocxMergeError::Config(format!(
                "Output directory name must be a plain directory name: '{}'",
                config.output_dir
            )));
        }

        // プレースホルダー書式の検証（重複は取り除く）
        if config.styles.is_empty() {
            return Err(DocxMergeError::Config(
                "At least one placeholder style is required".to_string(),
            ));
        }
        let mut deduped = Vec::new();
        for style in config.styles {
            if !deduped.contains(&style) {
                deduped.push(style);
            }
        }
        config.styles = deduped;

        Ok(Merger { config })
    }
}

/// 差し込み処理のオーケストレーター
///
/// すべての（レコード × テンプレート）ペアを逐次処理します。
/// スプレッドシート単位・ペア単位の失敗は捕捉して記録し、処理を
/// 継続します。実行を中断するのは入力ファイルが1つも見つからない
/// 場合（`MissingInput`）のみです。
pub struct Merger {
    /// 差し込み処理の設定
    config: MergeConfig,
}

impl Merger {
    /// ディレクトリ内のすべてのスプレッドシートとテンプレートを処理する
    ///
    /// # 引数
    ///
    /// * `dir` - 対象ディレクトリ（スプレッドシートとテンプレートの検出元。
    ///   出力ディレクトリもこの直下に作成される）
    ///
    /// # 戻り値
    ///
    /// * `Ok(MergeReport)` - 処理結果のレポート
    /// * `Err(DocxMergeError::MissingInput)` - テンプレートまたは
    ///   スプレッドシートが1つも見つからない場合。出力ディレクトリは
    ///   作成されません。
    ///
    /// # 処理フロー
    ///
    /// 1. 入力ファイルの検出（`~$`で始まるロックファイルと隠しファイルは除外）
    /// 2. 前提条件の検証（出力ディレクトリ作成前に確定する）
    /// 3. `merge()`による逐次処理
    pub fn merge_directory(&self, dir: impl AsRef<Path>) -> Result<MergeReport, DocxMergeError> {
        let dir = dir.as_ref();

        // 1. 入力ファイルの検出
        let templates = discover_inputs(dir, "docx")?;
        let spreadsheets = discover_inputs(dir, "xlsx")?;

        // 2. 前提条件の検証
        if templates.is_empty() {
            return Err(DocxMergeError::MissingInput(format!(
                "No .docx templates found in '{}'",
                dir.display()
            )));
        }
        if spreadsheets.is_empty() {
            return Err(DocxMergeError::MissingInput(format!(
                "No .xlsx spreadsheets found in '{}'",
                dir.display()
            )));
        }
        info!(
            "Found {} template(s) and {} spreadsheet(s) in '{}'",
            templates.len(),
            spreadsheets.len(),
            dir.display()
        );

        self.merge(&spreadsheets, &templates, dir)
    }

    /// 明示的なファイルリストに対して差し込み処理を実行する
    ///
    /// # 引数
    ///
    /// * `spreadsheets` - スプレッドシートファイルのパス（処理順）
    /// * `templates` - テンプレートファイルのパス（処理順）
    /// * `output_parent` - 出力ディレクトリの親ディレクトリ
    ///
    /// # 戻り値
    ///
    /// * `Ok(MergeReport)` - 全スプレッドシート・全テンプレートに
    ///   またがって集計された処理結果
    /// * `Err(DocxMergeError)` - 入力リストが空の場合、または
    ///   出力ディレクトリを作成できない場合
    pub fn merge(
        &self,
        spreadsheets: &[PathBuf],
        templates: &[PathBuf],
        output_parent: impl AsRef<Path>,
    ) -> Result<MergeReport, DocxMergeError> {
        if templates.is_empty() {
            return Err(DocxMergeError::MissingInput(
                "No templates to process".to_string(),
            ));
        }
        if spreadsheets.is_empty() {
            return Err(DocxMergeError::MissingInput(
                "No spreadsheets to process".to_string(),
            ));
        }

        // 出力ディレクトリは最初のレコードを処理する前に一度だけ作成する（冪等）
        let output_dir = output_parent.as_ref().join(&self.config.output_dir);
        fs::create_dir_all(&output_dir)?;

        let mut report = MergeReport::default();
        for spreadsheet in spreadsheets {
            let source_label = file_label(spreadsheet);

            // スプレッドシート単位の失敗はスキップして続行する
            let record_set = match records::load_records(spreadsheet) {
                Ok(set) => set,
                Err(e) => {
                    warn!("Skipping spreadsheet '{}': {}", source_label, e);
                    report.skipped.push(SkippedSpreadsheet {
                        spreadsheet: source_label,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            info!(
                "Read {} record(s) from '{}'",
                record_set.records().len(),
                record_set.source()
            );

            for record in record_set.records() {
                let replacements = placeholder::expand_placeholders(record, &self.config.styles);

                for template in templates {
                    match self.process_pair(record, &replacements, template, &output_dir) {
                        Ok(file_name) => {
                            info!("Generated '{}'", file_name);
                            report.produced.push(file_name);
                        }
                        Err(e) => {
                            // ペア単位の失敗は記録して続行する
                            warn!(
                                "Failed to process record '{}' with template '{}': {}",
                                record.key(),
                                file_label(template),
                                e
                            );
                            report.failures.push(PairFailure {
                                spreadsheet: record_set.source().to_string(),
                                record_key: record.key().to_string(),
                                template: file_label(template),
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// 1つの（レコード × テンプレート）ペアを処理する
    ///
    /// # 処理フロー
    ///
    /// 1. 出力ファイル名の計算（`<テンプレート名>_<キー>.<拡張子>`）
    /// 2. テンプレートを出力先へバイトコピー（テンプレート自体は不変）
    /// 3. コピーを読み込み、全テキストパートに置換を適用
    /// 4. 同じパスへ書き戻す
    ///
    /// 途中で失敗した場合、部分的に書かれた出力ファイルは削除されます。
    fn process_pair(
        &self,
        record: &Record,
        replacements: &HashMap<String, String>,
        template: &Path,
        output_dir: &Path,
    ) -> Result<String, DocxMergeError> {
        let file_name = output_file_name(template, record.key())?;
        let output_path = output_dir.join(&file_name);

        if let Err(e) = copy_and_substitute(template, &output_path, replacements) {
            // 部分的に書かれた出力を削除してからエラーを返す
            if output_path.exists() {
                let _ = fs::remove_file(&output_path);
            }
            return Err(e);
        }

        Ok(file_name)
    }
}

/// テンプレートをコピーし、コピーに置換を適用して保存する
fn copy_and_substitute(
    template: &Path,
    output_path: &Path,
    replacements: &HashMap<String, String>,
) -> Result<(), DocxMergeError> {
    fs::copy(template, output_path)?;
    let mut package = DocxPackage::open(output_path)?;
    package.substitute(replacements)?;
    package.save(output_path)?;
    Ok(())
}

/// 出力ファイル名を計算する
///
/// レコードキーにパス区切りが含まれる場合、出力が出力ディレクトリの
/// 外へ逃げるため拒否します。
fn output_file_name(template: &Path, key: &str) -> Result<String, DocxMergeError> {
    if key.contains('/') || key.contains('\\') {
        return Err(DocxMergeError::SecurityViolation(format!(
            "Record key contains a path separator: '{}'",
            key
        )));
    }

    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = template
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "docx".to_string());

    Ok(format!("{}_{}.{}", stem, key, extension))
}

/// 指定した拡張子の入力ファイルをディレクトリから検出する
///
/// Officeのロックファイル（`~$`で始まる）と隠しファイル（`.`で始まる）は
/// 除外します。結果はファイル名の辞書順にソートされます。
fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DocxMergeError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if name.starts_with("~$") || name.starts_with('.') {
            continue;
        }
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches_extension {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// レポートとログに使用するファイル名ラベルを取得する
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
