//! TextSubstitutor Module
//!
//! 書式付きスパン列に対するプレースホルダー置換アルゴリズムの実装。
//! 文書ライブラリに依存しない純粋関数として実装されており、
//! 単体でテスト可能です。

use std::collections::HashMap;

/// 1つの書式付きテキストスパン
///
/// テキスト領域（段落）内で同一の書式を共有する連続したテキストの
/// 単位です。書式`S`は置換アルゴリズムにとって不透明な値であり、
/// そのまま運ばれるだけです（DOCXレイヤーではランの`w:rPr`に
/// 対応します）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<S> {
    /// スパンのテキスト内容
    pub text: String,
    /// スパンの書式（不透明値）
    pub style: S,
}

impl<S> Span<S> {
    /// 新しいスパンを生成
    pub fn new(text: impl Into<String>, style: S) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// スパン列にプレースホルダー置換を適用
///
/// # 引数
///
/// * `spans` - テキスト領域を構成する書式付きスパン列（順序付き）
/// * `replacements` - リテラルトークン → 置換値のマッピング
///
/// # 戻り値
///
/// * `None` - 連結テキストにどのトークンも出現しない場合（fast path）。
///   領域は一切変更されません。
/// * `Some(spans)` - 置換後のスパン列
///
/// # アルゴリズム
///
/// 1. 全スパンのテキストを連結し、いずれかのトークンが部分文字列として
///    出現するか判定する。出現しなければ`None`（領域は無変更）。
/// 2. スパンが1つだけの場合、そのスパンのテキストに全置換を直接適用する。
///    書式は完全に保持される。
/// 3. スパンが複数の場合（トークンが書式境界をまたぐ場合）、連結テキストに
///    全置換を適用し、先頭スパンの書式を持つ1つのスパンに畳み込む。
///    テキスト内容の正しさは保たれるが、領域内の書式境界は失われる
///    （意図的な単純化）。
///
/// # 注意
///
/// 置換はマップの反復順に適用され、順序は保証されません。トークン同士の
/// リテラル文字列が重なる入力はサポート対象外です（動作は未定義）。
pub fn substitute_spans<S: Clone>(
    spans: &[Span<S>],
    replacements: &HashMap<String, String>,
) -> Option<Vec<Span<S>>> {
    if spans.is_empty() || replacements.is_empty() {
        return None;
    }

    // 1. 全スパンのテキストを連結して領域全体のテキストを得る
    let full_text: String = spans.iter().map(|s| s.text.as_str()).collect();
    let needs_replacement = replacements
        .keys()
        .any(|token| !token.is_empty() && full_text.contains(token.as_str()));
    if !needs_replacement {
        return None;
    }

    // 2. 単一スパン: そのスパンのテキストに直接置換を適用する
    if spans.len() == 1 {
        let text = apply_replacements(spans[0].text.clone(), replacements);
        return Some(vec![Span {
            text,
            style: spans[0].style.clone(),
        }]);
    }

    // 3. 複数スパン: 連結テキストに置換を適用し、先頭スパンの書式で
    //    1つのスパンに畳み込む
    let text = apply_replacements(full_text, replacements);
    Some(vec![Span {
        text,
        style: spans[0].style.clone(),
    }])
}

/// テキストにすべての置換を適用
fn apply_replacements(mut text: String, replacements: &HashMap<String, String>) -> String {
    for (token, value) in replacements {
        if !token.is_empty() && text.contains(token.as_str()) {
            text = text.replace(token.as_str(), value);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // fast pathのテスト: トークンが出現しない領域は無変更（None）
    #[test]
    fn test_fast_path_returns_none() {
        let spans = vec![Span::new("Hello World", false)];
        let map = map_of(&[("{name}", "Alice")]);

        assert!(substitute_spans(&spans, &map).is_none());
    }

    #[test]
    fn test_empty_map_returns_none() {
        let spans = vec![Span::new("Hello {name}", false)];
        let map = HashMap::new();

        assert!(substitute_spans(&spans, &map).is_none());
    }

    #[test]
    fn test_empty_spans_returns_none() {
        let spans: Vec<Span<bool>> = vec![];
        let map = map_of(&[("{name}", "Alice")]);

        assert!(substitute_spans(&spans, &map).is_none());
    }

    // 単一スパンのテスト: 書式は保持される
    #[test]
    fn test_single_span_round_trip() {
        let spans = vec![Span::new("Hello {name}", true)];
        let map = map_of(&[("{name}", "World")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Hello World");
        assert!(result[0].style);
    }

    #[test]
    fn test_single_span_multiple_tokens() {
        let spans = vec![Span::new("{greeting}, {name}!", 7u32)];
        let map = map_of(&[("{greeting}", "Hello"), ("{name}", "Alice")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result[0].text, "Hello, Alice!");
        assert_eq!(result[0].style, 7);
    }

    #[test]
    fn test_single_span_repeated_token() {
        let spans = vec![Span::new("{x} and {x}", ())];
        let map = map_of(&[("{x}", "y")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result[0].text, "y and y");
    }

    // 複数スパンのテスト: 先頭スパンの書式で1つに畳み込まれる。
    // 2番目以降のスパンの書式が失われるのは仕様どおりの動作
    #[test]
    fn test_multi_span_collapses_to_first_style() {
        let spans = vec![Span::new("Hello ", false), Span::new("{name}", true)];
        let map = map_of(&[("{name}", "World")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Hello World");
        assert!(!result[0].style); // bold=falseの書式が領域全体に適用される
    }

    #[test]
    fn test_multi_span_token_straddles_boundary() {
        // トークンがスパン境界をまたいでいても連結テキスト上で一致する
        let spans = vec![
            Span::new("Dear {na", 1u8),
            Span::new("me}, welcome to {ci", 2u8),
            Span::new("ty}.", 3u8),
        ];
        let map = map_of(&[("{name}", "Alice"), ("{city}", "Kyoto")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Dear Alice, welcome to Kyoto.");
        assert_eq!(result[0].style, 1);
    }

    #[test]
    fn test_multi_span_without_match_is_untouched() {
        let spans = vec![Span::new("Hello ", false), Span::new("World", true)];
        let map = map_of(&[("{name}", "Alice")]);

        assert!(substitute_spans(&spans, &map).is_none());
    }

    #[test]
    fn test_unmatched_tokens_pass_through() {
        // マップにないプレースホルダーはリテラルのまま残る
        let spans = vec![Span::new("{known} and {unknown}", ())];
        let map = map_of(&[("{known}", "value")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result[0].text, "value and {unknown}");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let spans = vec![Span::new("Hello", ())];
        let map = map_of(&[("", "X")]);

        assert!(substitute_spans(&spans, &map).is_none());
    }

    #[test]
    fn test_replacement_with_empty_value() {
        let spans = vec![Span::new("A{gap}B", ())];
        let map = map_of(&[("{gap}", "")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result[0].text, "AB");
    }

    #[test]
    fn test_multibyte_text() {
        let spans = vec![Span::new("氏名: ", 0), Span::new("{姓名}", 1)];
        let map = map_of(&[("{姓名}", "山田太郎")]);

        let result = substitute_spans(&spans, &map).unwrap();
        assert_eq!(result[0].text, "氏名: 山田太郎");
        assert_eq!(result[0].style, 0);
    }
}
