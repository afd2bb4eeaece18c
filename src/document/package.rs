//! DOCX Package Module
//!
//! DOCXファイル（ZIPアーカイブ）のエントリ読み込み・書き戻しと、
//! テキストを持つパートの選別を実装するモジュール。

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::rewrite;
use crate::error::DocxMergeError;
use crate::security::{self, SecurityConfig};

/// メモリ上に展開されたDOCXパッケージ
///
/// ZIPエントリを元の順序のまま保持します。置換はテキストを持つ
/// パートにのみ適用され、その他のエントリ（画像、スタイル定義、
/// リレーションシップなど）はバイト単位で保持されます。
pub(crate) struct DocxPackage {
    /// (エントリ名, エントリ内容) のリスト（アーカイブ内の順序）
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// DOCXファイルを開く
    ///
    /// # 引数
    ///
    /// * `path` - DOCXファイルのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(DocxPackage)` - 読み込みに成功した場合
    /// * `Err(DocxMergeError)` - ZIPとして開けない場合、または
    ///   セキュリティ制限に違反した場合
    pub fn open(path: &Path) -> Result<Self, DocxMergeError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// リーダーからDOCXパッケージを読み込む
    ///
    /// # 引数
    ///
    /// * `reader` - DOCXファイルを読み込むためのリーダー（Read + Seekトレイトを実装）
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, DocxMergeError> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| DocxMergeError::Zip(format!("{}", e)))?;

        // セキュリティチェック: エントリ数、パス、サイズの検証
        let security_config = SecurityConfig::default();
        security::validate_archive(&mut archive, &security_config)?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| DocxMergeError::Zip(format!("{}", e)))?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        Ok(Self { entries })
    }

    /// テキストを持つすべてのパートにプレースホルダー置換を適用
    ///
    /// 対象パートは本文（word/document.xml）と、すべてのヘッダー・
    /// フッターパート（word/header*.xml、word/footer*.xml。先頭ページ用・
    /// 偶数ページ用はそれぞれ独立したパートとして格納されるため、
    /// すべてのバリアントが対象になります）。表のセル段落は各パートの
    /// XML内に含まれるため、ネストした表も含めて処理されます。
    ///
    /// # 引数
    ///
    /// * `replacements` - リテラルトークン → 置換値のマッピング
    ///
    /// # 戻り値
    ///
    /// * `Ok(usize)` - 書き換えが発生したパートの数。トークンを含まない
    ///   パートは元のバイト列のまま保持されます。
    pub fn substitute(
        &mut self,
        replacements: &HashMap<String, String>,
    ) -> Result<usize, DocxMergeError> {
        let mut rewritten = 0;
        for (name, data) in &mut self.entries {
            if !is_text_part(name) {
                continue;
            }
            if let Some(new_data) = rewrite::rewrite_part(data, replacements)? {
                *data = new_data;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }

    /// パッケージをDOCXファイルとして書き出す
    ///
    /// メディアファイル（word/media/）は無圧縮（Stored）、その他の
    /// エントリはDeflate圧縮で格納します。
    ///
    /// # 引数
    ///
    /// * `path` - 出力先のパス（既存ファイルは上書き）
    pub fn save(&self, path: &Path) -> Result<(), DocxMergeError> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);

        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)
                .map_err(|e| DocxMergeError::Zip(format!("{}", e)))?;
            zip.write_all(data)?;
        }

        zip.finish()
            .map_err(|e| DocxMergeError::Zip(format!("{}", e)))?;
        Ok(())
    }

    /// 指定した名前のパートの内容を取得（テスト用）
    #[cfg(test)]
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, data)| data.as_slice())
    }
}

/// プレースホルダー置換の対象となるパートかどうかを判定
///
/// 本文、ヘッダー、フッターのXMLパートが対象です。
fn is_text_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}
