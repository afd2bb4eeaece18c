//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃やパストラバーサル攻撃への対策を提供します。
//! 制限は入力スプレッドシート（XLSX）とテンプレート文書（DOCX）の
//! 両方のアーカイブに適用されます。

use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::error::DocxMergeError;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

/// 入力ファイルサイズの上限を検証
///
/// # 引数
///
/// * `size` - 読み込んだバイト数
/// * `config` - セキュリティ設定
///
/// # 戻り値
///
/// * `Ok(())` - サイズが上限以下の場合
/// * `Err(DocxMergeError::SecurityViolation)` - 上限を超えた場合
pub(crate) fn validate_input_size(size: u64, config: &SecurityConfig) -> Result<(), DocxMergeError> {
    if size > config.max_input_file_size {
        return Err(DocxMergeError::SecurityViolation(format!(
            "Input file size exceeds maximum: {} bytes (max: {} bytes)",
            size, config.max_input_file_size
        )));
    }
    Ok(())
}

/// ZIPアーカイブ全体を検証
///
/// ファイル数の上限、各エントリのパスとサイズ、展開後サイズの累計を
/// チェックします。アーカイブ内のエントリを読み込む前に呼び出します。
///
/// # 引数
///
/// * `archive` - 検証するZIPアーカイブ
/// * `config` - セキュリティ設定
///
/// # 戻り値
///
/// * `Ok(())` - すべてのエントリが制限内の場合
/// * `Err(DocxMergeError::SecurityViolation)` - 制限に違反した場合
pub(crate) fn validate_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    config: &SecurityConfig,
) -> Result<(), DocxMergeError> {
    // ファイル数の上限
    if archive.len() > config.max_file_count {
        return Err(DocxMergeError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            config.max_file_count
        )));
    }

    // 各エントリのパス検証とサイズチェック
    let mut total_decompressed_size = 0u64;
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| DocxMergeError::Zip(format!("{}", e)))?;

        // パストラバーサル対策
        let file_name = file.name();
        validate_zip_path(file_name)
            .map_err(|e| DocxMergeError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

        // ファイルサイズチェック
        let file_size = file.size();
        if file_size > config.max_file_size {
            return Err(DocxMergeError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                file_name, file_size, config.max_file_size
            )));
        }

        // 展開後のサイズ累計をチェック
        total_decompressed_size = total_decompressed_size
            .checked_add(file_size)
            .ok_or_else(|| {
                DocxMergeError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

        if total_decompressed_size > config.max_decompressed_size {
            return Err(DocxMergeError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_decompressed_size, config.max_decompressed_size
            )));
        }
    }

    Ok(())
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、アーカイブ内のエントリパスを検証します。
///
/// # 引数
///
/// * `path` - 検証するファイルパス
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    // 空のパスは拒否
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    // `..`を含むパスを拒否（ディレクトリトラバーサル攻撃）
    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
