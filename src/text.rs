use crate::fonts::{FontFace, FontSet, FontVariant};
use crate::model::ContentBlock;
use crate::style::{Role, StyleSheet, TextStyle};

/// A styled run of text fed to the line builder.
#[derive(Clone, Debug)]
pub struct Span<'a> {
    pub text: &'a str,
    pub variant: FontVariant,
    pub font_size: f32,
    pub underline: bool,
}

impl<'a> Span<'a> {
    pub fn styled(text: &'a str, style: &TextStyle) -> Self {
        Span {
            text,
            variant: FontVariant::new(style.bold, style.italic),
            font_size: style.font_size(),
            underline: style.underline,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WordChunk {
    pub variant: FontVariant,
    pub text: String,
    pub font_size: f32,
    pub x_offset: f32, // x relative to line start
    pub width: f32,
    pub underline: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TextLine {
    pub chunks: Vec<WordChunk>,
    pub total_width: f32,
}

fn finish_line(chunks: &mut Vec<WordChunk>) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
    }
}

/// Greedy word wrap. `first_line_reserve` narrows only the first line
/// (first-line indent, right-aligned tail text). No space is inserted between
/// spans unless one side carries whitespace, so "bold" + ", x" stays "bold,".
/// Always returns at least one (possibly empty) line.
pub fn build_lines(
    spans: &[Span],
    fonts: &FontSet,
    max_width: f32,
    first_line_reserve: f32,
) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;

    for span in spans {
        let face = fonts.face(span.variant);
        let space_w = face.space_width(span.font_size);
        let starts_with_ws = span.text.starts_with(char::is_whitespace);

        for (i, word) in span.text.split_whitespace().enumerate() {
            let ww = face.word_width(word, span.font_size);
            let need_space = !current.is_empty() && (i > 0 || starts_with_ws || prev_ended_with_ws);
            let gap = if i > 0 || starts_with_ws {
                space_w
            } else {
                prev_space_w
            };
            let proposed_x = if need_space { current_x + gap } else { current_x };

            let line_max = if lines.is_empty() {
                max_width - first_line_reserve
            } else {
                max_width
            };
            if !current.is_empty() && proposed_x + ww > line_max {
                lines.push(finish_line(&mut current));
                current_x = 0.0;
            } else {
                current_x = proposed_x;
            }

            // A word wider than a whole line is cut at char boundaries.
            let mut rest = word;
            loop {
                let limit = if lines.is_empty() {
                    max_width - first_line_reserve
                } else {
                    max_width
                };
                let (piece, tail) = if current_x + face.word_width(rest, span.font_size) <= limit {
                    (rest, "")
                } else {
                    split_to_width(rest, face, span.font_size, limit - current_x)
                };
                let pw = face.word_width(piece, span.font_size);
                current.push(WordChunk {
                    variant: span.variant,
                    text: piece.to_string(),
                    font_size: span.font_size,
                    x_offset: current_x,
                    width: pw,
                    underline: span.underline,
                });
                current_x += pw;
                if tail.is_empty() {
                    break;
                }
                lines.push(finish_line(&mut current));
                current_x = 0.0;
                rest = tail;
            }
        }

        if !span.text.is_empty() {
            prev_ended_with_ws = span.text.ends_with(char::is_whitespace);
            prev_space_w = space_w;
        }
    }

    if !current.is_empty() {
        lines.push(finish_line(&mut current));
    }
    if lines.is_empty() {
        lines.push(TextLine::default());
    }
    lines
}

/// Longest prefix of `word` no wider than `room`. Always takes at least one
/// char so an over-wide glyph still makes progress.
fn split_to_width<'w>(word: &'w str, face: &FontFace, font_size: f32, room: f32) -> (&'w str, &'w str) {
    let mut width = 0.0;
    let mut end = 0;
    for (i, ch) in word.char_indices() {
        width += face.char_width_1000(ch) * font_size / 1000.0;
        if i > 0 && width > room {
            break;
        }
        end = i + ch.len_utf8();
    }
    word.split_at(end)
}

/// Width of a single unwrapped run.
pub fn text_width(text: &str, style: &TextStyle, fonts: &FontSet) -> f32 {
    let face = fonts.face(FontVariant::new(style.bold, style.italic));
    let size = style.font_size();
    let words: Vec<&str> = text.split_whitespace().collect();
    let gaps = words.len().saturating_sub(1) as f32;
    words.iter().map(|w| face.word_width(w, size)).sum::<f32>() + gaps * face.space_width(size)
}

/// Baseline-to-baseline distance for `style` under the sheet's line spacing.
pub fn line_pitch(style: &TextStyle, sheet: &StyleSheet, fonts: &FontSet) -> f32 {
    let face = fonts.face(FontVariant::new(style.bold, style.italic));
    face.line_height(style.font_size()) * sheet.line_factor()
}

/// Gap kept between a paragraph's main text and its right-aligned tail.
pub const TAIL_GAP: f32 = 12.0;

/// Lines of a paragraph block, with the first-line reservation it implies.
/// Returns `None` for anything that is not a paragraph.
pub fn paragraph_lines(
    block: &ContentBlock,
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> Option<(Vec<TextLine>, f32)> {
    let ContentBlock::Paragraph {
        text,
        role,
        indent_first_line,
        lead,
        tail,
        continuation,
        ..
    } = block
    else {
        return None;
    };
    let style = sheet.style(*role);
    let lead_style = TextStyle { bold: true, ..style };
    let mut spans = Vec::with_capacity(2);
    if let Some(lead) = lead {
        spans.push(Span::styled(lead, &lead_style));
    }
    spans.push(Span::styled(text, &style));

    let mut reserve = 0.0;
    if *indent_first_line && !*continuation {
        reserve += style.first_line_indent();
    }
    if let Some(tail) = tail {
        reserve += text_width(tail, &style, fonts) + TAIL_GAP;
    }
    Some((build_lines(&spans, fonts, width, reserve), reserve))
}

/// Lines of a heading's main text followed by its optional subtitle lines.
pub fn heading_lines(
    text: &str,
    subtitle: Option<&str>,
    role: Role,
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> (Vec<TextLine>, Vec<TextLine>) {
    let style = sheet.style(role);
    let main = build_lines(&[Span::styled(text, &style)], fonts, width, 0.0);
    let sub = subtitle
        .map(|s| build_lines(&[Span::styled(s, &subtitle_style())], fonts, width, 0.0))
        .unwrap_or_default();
    (main, sub)
}

/// Subtitle line under a heading (the abstract page's domain line).
pub fn subtitle_style() -> TextStyle {
    TextStyle {
        size: 24,
        bold: false,
        italic: false,
        underline: false,
        align: crate::model::Alignment::Center,
        before: 0,
        after: 0,
        first_line: 0,
        keep_next: false,
        shaded: false,
    }
}

/// A wrapped line that remembers the style it was built with.
#[derive(Clone, Debug)]
pub struct StyledLine {
    pub line: TextLine,
    pub style: TextStyle,
    pub pitch: f32,
}

/// Wrap a column of (text, role) entries, each starting on its own line.
pub fn wrap_entries(
    entries: &[(String, Role)],
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> Vec<StyledLine> {
    let mut out = Vec::new();
    for (text, role) in entries {
        let style = sheet.style(*role);
        let pitch = line_pitch(&style, sheet, fonts);
        for line in build_lines(&[Span::styled(text, &style)], fonts, width, 0.0) {
            out.push(StyledLine { line, style, pitch });
        }
    }
    out
}

pub fn stack_height(lines: &[StyledLine]) -> f32 {
    lines.iter().map(|l| l.pitch).sum()
}

/// Width kept free at the right of a contents line for its page label.
pub const TOC_LABEL_RESERVE: f32 = 36.0;

/// Chapter-level contents entries are bold.
pub fn toc_style(sheet: &StyleSheet, level: u8) -> TextStyle {
    let style = sheet.style(Role::TocLine);
    TextStyle {
        bold: level <= 1,
        ..style
    }
}

pub fn toc_lines(
    text: &str,
    level: u8,
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> Vec<TextLine> {
    let style = toc_style(sheet, level);
    build_lines(&[Span::styled(text, &style)], fonts, width - TOC_LABEL_RESERVE, 0.0)
}
