//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// プレースホルダーの括弧書式
///
/// テンプレート文書内でフィールド値の差し込み位置を示すトークンの
/// 書式を指定します。テンプレート作成者がどの書式を使っても動作する
/// よう、デフォルトではすべての書式が同時に有効です。
///
/// # 使用例
///
/// ```rust
/// use docxmerge::PlaceholderStyle;
///
/// assert_eq!(PlaceholderStyle::CurlySingle.wrap("name"), "{name}");
/// assert_eq!(PlaceholderStyle::CurlyDouble.wrap("name"), "{{name}}");
/// assert_eq!(PlaceholderStyle::Square.wrap("name"), "[name]");
/// assert_eq!(PlaceholderStyle::Angle.wrap("name"), "<name>");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaceholderStyle {
    /// 波括弧1重: `{field}`
    CurlySingle,

    /// 波括弧2重: `{{field}}`
    ///
    /// Jinja2やMustacheに慣れたテンプレート作成者向けの書式です。
    CurlyDouble,

    /// 角括弧: `[field]`
    Square,

    /// 山括弧: `<field>`
    ///
    /// 文書本文では `<` と `>` はリテラル文字として扱われます
    /// （XMLエスケープはファイル格納時の表現にのみ現れます）。
    Angle,
}

impl PlaceholderStyle {
    /// すべての書式（デフォルト設定）
    pub const ALL: [PlaceholderStyle; 4] = [
        PlaceholderStyle::CurlySingle,
        PlaceholderStyle::CurlyDouble,
        PlaceholderStyle::Square,
        PlaceholderStyle::Angle,
    ];

    /// フィールド名をこの書式のプレースホルダートークンに変換
    ///
    /// # 引数
    ///
    /// * `field` - フィールド名（ヘッダーセルの値）
    ///
    /// # 戻り値
    ///
    /// リテラルなプレースホルダートークン文字列
    pub fn wrap(&self, field: &str) -> String {
        match self {
            PlaceholderStyle::CurlySingle => format!("{{{}}}", field),
            PlaceholderStyle::CurlyDouble => format!("{{{{{}}}}}", field),
            PlaceholderStyle::Square => format!("[{}]", field),
            PlaceholderStyle::Angle => format!("<{}>", field),
        }
    }
}
