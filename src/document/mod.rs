//! Document Module
//!
//! テンプレート文書（DOCX）の読み書きと、テキストを持つ各パートへの
//! プレースホルダー置換の適用を実装するモジュール。
//! DOCXはZIPアーカイブであり、パート単位のXML書き換えには
//! zipとquick-xmlを直接使用します。

mod package;
mod rewrite;

pub(crate) use package::DocxPackage;
