//! PlaceholderExpander Module
//!
//! レコードからプレースホルダー置換マップを構築するモジュール。
//! 各フィールドに対して、設定されたすべての括弧書式のトークンを生成します。

use std::collections::HashMap;

use crate::api::PlaceholderStyle;
use crate::types::Record;

/// レコードからプレースホルダー置換マップを構築
///
/// # 引数
///
/// * `record` - 対象レコード
/// * `styles` - 生成するプレースホルダー書式のリスト
///
/// # 戻り値
///
/// リテラルなプレースホルダートークン → 置換値のマッピング。
/// フィールドごとに書式の数だけエントリが生成されます。
///
/// # 注意
///
/// 値が空のフィールドはマップから除外されます。そのプレースホルダーは
/// 出力文書にそのまま残ります（意図的なパススルーであり、エラーでは
/// ありません）。異なるフィールドのトークン同士が部分文字列として
/// 重なる場合の動作は未定義です。
pub fn expand_placeholders(
    record: &Record,
    styles: &[PlaceholderStyle],
) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in record.fields() {
        // 空値のフィールドは除外する（プレースホルダーはそのまま残る）
        if value.is_empty() {
            continue;
        }
        for style in styles {
            map.insert(style.wrap(name), value.clone());
        }
    }
    map
}
