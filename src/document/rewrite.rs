//! Part Rewrite Module
//!
//! 文書パート（XML）を段落単位でストリーム処理し、各段落のラン列を
//! スパン列として置換アルゴリズムに渡すモジュール。
//! 置換が発生しなかったパートは元のバイト列を維持します。

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;

use crate::error::DocxMergeError;
use crate::substitute::{self, Span};

/// 段落内の1つのラン（`<w:r>`要素）の位置情報
///
/// インデックスはバッファした段落イベント列に対するものです。
struct RunSlot {
    /// ランの開始イベント（`Start`または`Empty`）
    start: usize,
    /// ランの終了イベント（`Empty`の場合は`start`と同じ）
    end: usize,
    /// `<w:rPr>`サブツリーの範囲（両端を含む）
    props: Option<(usize, usize)>,
    /// ラン内の`<w:t>`テキスト（アンエスケープ済み、連結）
    text: String,
}

/// 文書パートにプレースホルダー置換を適用
///
/// # 引数
///
/// * `xml` - パートのXMLバイト列
/// * `replacements` - リテラルトークン → 置換値のマッピング
///
/// # 戻り値
///
/// * `Ok(None)` - どの段落にもトークンが出現しなかった場合。
///   呼び出し側は元のバイト列をそのまま使用します（fast path）。
/// * `Ok(Some(bytes))` - 1つ以上の段落を書き換えた場合の新しいXML
/// * `Err(DocxMergeError)` - XMLの解析に失敗した場合
pub(crate) fn rewrite_part(
    xml: &[u8],
    replacements: &HashMap<String, String>,
) -> Result<Option<Vec<u8>>, DocxMergeError> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut changed = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(xml_err)?
            .into_owned();
        buf.clear();

        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.name().as_ref() == b"w:p" => {
                // 段落全体をバッファし、置換を適用して書き出す
                let paragraph = collect_paragraph(&mut reader, event.clone())?;
                if write_paragraph(&mut writer, &paragraph, replacements)? {
                    changed = true;
                }
            }
            other => write_event(&mut writer, other)?,
        }
    }

    if changed {
        Ok(Some(writer.into_inner()))
    } else {
        Ok(None)
    }
}

/// 段落の開始タグから終了タグまでのイベントを収集
///
/// テキストボックス経由で段落がネストする場合があるため、深さを
/// 追跡して外側の段落の終了まで読み進めます。
fn collect_paragraph(
    reader: &mut Reader<&[u8]>,
    start: Event<'static>,
) -> Result<Vec<Event<'static>>, DocxMergeError> {
    let mut events = vec![start];
    let mut depth = 1usize;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(xml_err)?
            .into_owned();
        buf.clear();

        match &event {
            Event::Start(e) if e.name().as_ref() == b"w:p" => depth += 1,
            Event::End(e) if e.name().as_ref() == b"w:p" => depth -= 1,
            Event::Eof => {
                return Err(DocxMergeError::Xml(
                    "Unexpected end of XML inside a paragraph".to_string(),
                ))
            }
            _ => {}
        }

        events.push(event);
        if depth == 0 {
            break;
        }
    }

    Ok(events)
}

/// バッファした段落を（必要なら置換して）書き出す
///
/// # 戻り値
///
/// 段落を書き換えた場合は`true`、そのまま書き出した場合は`false`
fn write_paragraph(
    writer: &mut Writer<Vec<u8>>,
    events: &[Event<'static>],
    replacements: &HashMap<String, String>,
) -> Result<bool, DocxMergeError> {
    let runs = scan_runs(events)?;
    let spans: Vec<Span<usize>> = runs
        .iter()
        .enumerate()
        .map(|(idx, run)| Span::new(run.text.clone(), idx))
        .collect();

    let substituted = substitute::substitute_spans(&spans, replacements);
    let new_spans = match substituted {
        Some(new_spans) => new_spans,
        None => {
            // fast path: バッファしたイベントをそのまま書き出す
            for event in events {
                write_event(writer, event.clone())?;
            }
            return Ok(false);
        }
    };

    // 置換後のテキストは先頭ラン（キャリアラン）が保持する。
    // 残りのランは書式（w:rPr）のみを残し、テキストを失う
    let carrier_text = new_spans
        .first()
        .map(|s| s.text.clone())
        .unwrap_or_default();

    let mut i = 0;
    while i < events.len() {
        if let Some(run_idx) = runs.iter().position(|r| r.start == i) {
            let run = &runs[run_idx];
            let new_text = if run_idx == 0 {
                Some(carrier_text.as_str())
            } else {
                None
            };
            emit_run(writer, events, run, new_text)?;
            i = run.end + 1;
        } else {
            write_event(writer, events[i].clone())?;
            i += 1;
        }
    }

    Ok(true)
}

/// 段落イベント列からランを抽出
///
/// ネストした段落（テキストボックス内容）の中のランは、外側の段落の
/// スパンとしては扱いません。
fn scan_runs(events: &[Event<'static>]) -> Result<Vec<RunSlot>, DocxMergeError> {
    let mut runs = Vec::new();
    let mut nested_p = 0usize;
    // events[0]は段落自身の開始タグ
    let mut i = 1;
    while i < events.len() {
        match &events[i] {
            Event::Start(e) if e.name().as_ref() == b"w:p" => nested_p += 1,
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                nested_p = nested_p.saturating_sub(1);
            }
            Event::Empty(e) if nested_p == 0 && e.name().as_ref() == b"w:r" => {
                runs.push(RunSlot {
                    start: i,
                    end: i,
                    props: None,
                    text: String::new(),
                });
            }
            Event::Start(e) if nested_p == 0 && e.name().as_ref() == b"w:r" => {
                let slot = scan_single_run(events, i)?;
                i = slot.end;
                runs.push(slot);
            }
            _ => {}
        }
        i += 1;
    }
    Ok(runs)
}

/// 1つのラン（`<w:r>`の開始から終了まで）を走査
fn scan_single_run(events: &[Event<'static>], start: usize) -> Result<RunSlot, DocxMergeError> {
    let mut props = None;
    let mut text = String::new();
    let mut in_text = false;

    let mut j = start + 1;
    while j < events.len() {
        match &events[j] {
            Event::Start(e) if e.name().as_ref() == b"w:rPr" => {
                // w:rPrサブツリーを読み飛ばして範囲を記録する
                let begin = j;
                let mut depth = 1usize;
                while depth > 0 {
                    j += 1;
                    if j >= events.len() {
                        return Err(DocxMergeError::Xml("Unterminated w:rPr".to_string()));
                    }
                    match &events[j] {
                        Event::Start(e) if e.name().as_ref() == b"w:rPr" => depth += 1,
                        Event::End(e) if e.name().as_ref() == b"w:rPr" => depth -= 1,
                        _ => {}
                    }
                }
                props = Some((begin, j));
            }
            Event::Empty(e) if e.name().as_ref() == b"w:rPr" => {
                props = Some((j, j));
            }
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                text.push_str(&t.unescape().map_err(xml_err)?);
            }
            Event::CData(c) if in_text => {
                text.push_str(std::str::from_utf8(c.as_ref())?);
            }
            Event::End(e) if e.name().as_ref() == b"w:r" => {
                return Ok(RunSlot {
                    start,
                    end: j,
                    props,
                    text,
                });
            }
            _ => {}
        }
        j += 1;
    }

    Err(DocxMergeError::Xml("Unterminated w:r".to_string()))
}

/// 1つのランを書き出す
///
/// ランの開始タグと`w:rPr`は元のまま保持します。`new_text`が指定された
/// 場合（キャリアラン）は置換後の全テキストを1つの`<w:t>`として出力し、
/// 指定されない場合はテキスト子要素を持たないランになります。
fn emit_run(
    writer: &mut Writer<Vec<u8>>,
    events: &[Event<'static>],
    run: &RunSlot,
    new_text: Option<&str>,
) -> Result<(), DocxMergeError> {
    let start_tag = match &events[run.start] {
        Event::Start(e) => e.clone(),
        Event::Empty(e) => e.clone(),
        _ => return Err(DocxMergeError::Xml("Malformed run events".to_string())),
    };
    write_event(writer, Event::Start(start_tag))?;

    // ランプロパティは元のまま保持する
    if let Some((begin, end)) = run.props {
        for j in begin..=end {
            write_event(writer, events[j].clone())?;
        }
    }

    if let Some(text) = new_text {
        // 前後の空白が失われないようxml:spaceを常に指定する
        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        write_event(writer, Event::Start(t))?;
        write_event(writer, Event::Text(BytesText::new(text)))?;
        write_event(writer, Event::End(BytesEnd::new("w:t")))?;
    }

    write_event(writer, Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocxMergeError> {
    writer
        .write_event(event)
        .map_err(|e| DocxMergeError::Xml(e.to_string()))
}

fn xml_err(e: quick_xml::Error) -> DocxMergeError {
    DocxMergeError::Xml(e.to_string())
}
