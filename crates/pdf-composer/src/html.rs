//! Block layout for the HTML produced from markdown explanations.
//!
//! The markup is parsed as XML, so anything that is not well formed is
//! reported as [`ComposerError::Markup`] and left to the caller. Layout is a
//! flat stack of blocks: no floats, no boxes, no tables beyond one line per
//! row.

use crate::css::{heading_level, HtmlStyle};
use crate::error::ComposerError;
use crate::fonts::{FaceKey, FontRegistry};
use marginalia_traits::TextBlock;
use marginalia_types::Rect;
use roxmltree::Node;

const BULLET: &str = "\u{2022}";
const CELL_SEPARATOR: &str = " | ";
/// Indentation per nesting level, in ems of the body font.
const INDENT_EM: f32 = 1.5;
/// Lines whose bottom passes the rect by less than this are still drawn.
const FIT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inline {
    Text { text: String, bold: bool, mono: bool },
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BlockKind {
    Paragraph,
    Heading(usize),
    Code,
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub kind: BlockKind,
    pub inlines: Vec<Inline>,
    pub depth: usize,
    pub marker: Option<String>,
}

impl Block {
    fn new(kind: BlockKind, inlines: Vec<Inline>, depth: usize, marker: Option<String>) -> Self {
        Self {
            kind,
            inlines,
            depth,
            marker,
        }
    }

    fn has_text(&self) -> bool {
        self.inlines.iter().any(|i| match i {
            Inline::Text { text, .. } => !text.trim().is_empty(),
            Inline::Break => false,
        })
    }
}

pub(crate) fn parse_blocks(html: &str) -> Result<Vec<Block>, ComposerError> {
    let wrapped = format!("<body>{html}</body>");
    let doc = roxmltree::Document::parse(&wrapped).map_err(|e| ComposerError::Markup(e.to_string()))?;
    let mut collector = BlockCollector::default();
    collector.container(doc.root_element(), 0);
    Ok(collector.blocks)
}

fn is_block(node: &Node) -> bool {
    node.is_element()
        && matches!(
            node.tag_name().name(),
            "p" | "pre"
                | "ul"
                | "ol"
                | "li"
                | "blockquote"
                | "table"
                | "hr"
                | "div"
                | "section"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
        )
}

#[derive(Default)]
struct BlockCollector {
    blocks: Vec<Block>,
}

impl BlockCollector {
    fn container(&mut self, node: Node, depth: usize) {
        let mut pending = Vec::new();
        for child in node.children() {
            if is_block(&child) {
                self.flush(&mut pending, depth, None);
                self.block(child, depth);
            } else {
                collect_inline(child, false, false, &mut pending);
            }
        }
        self.flush(&mut pending, depth, None);
    }

    fn flush(&mut self, pending: &mut Vec<Inline>, depth: usize, marker: Option<String>) {
        let block = Block::new(BlockKind::Paragraph, std::mem::take(pending), depth, marker);
        if block.has_text() || block.marker.is_some() {
            self.blocks.push(block);
        }
    }

    fn block(&mut self, node: Node, depth: usize) {
        let tag = node.tag_name().name();
        match tag {
            "p" => {
                let inlines = inline_children(node, false);
                self.push_if_text(Block::new(BlockKind::Paragraph, inlines, depth, None));
            }
            "pre" => {
                let mut text: String = node.descendants().filter_map(|n| n.text()).collect();
                if text.ends_with('\n') {
                    text.pop();
                }
                let inlines = vec![Inline::Text {
                    text,
                    bold: false,
                    mono: true,
                }];
                self.blocks.push(Block::new(BlockKind::Code, inlines, depth, None));
            }
            "ul" | "ol" => self.list(node, depth, tag == "ol"),
            "blockquote" => self.container(node, depth + 1),
            "table" => self.table(node, depth),
            "hr" => self.blocks.push(Block::new(BlockKind::Rule, Vec::new(), depth, None)),
            _ => match heading_level(tag) {
                Some(level) => {
                    let inlines = inline_children(node, true);
                    self.push_if_text(Block::new(BlockKind::Heading(level), inlines, depth, None));
                }
                None => self.container(node, depth),
            },
        }
    }

    fn push_if_text(&mut self, block: Block) {
        if block.has_text() {
            self.blocks.push(block);
        }
    }

    fn list(&mut self, node: Node, depth: usize, ordered: bool) {
        let start: usize = node
            .attribute("start")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let items = node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "li");
        for (n, item) in items.enumerate() {
            let marker = if ordered {
                format!("{}.", start + n)
            } else {
                BULLET.to_string()
            };
            self.list_item(item, depth + 1, marker);
        }
    }

    fn list_item(&mut self, node: Node, depth: usize, marker: String) {
        let mut marker = Some(marker);
        let mut pending = Vec::new();
        for child in node.children() {
            if child.is_element() && child.tag_name().name() == "p" {
                pending.extend(inline_children(child, false));
                self.flush(&mut pending, depth, marker.take());
            } else if is_block(&child) {
                if pending.iter().any(|i| matches!(i, Inline::Text { text, .. } if !text.trim().is_empty())) {
                    self.flush(&mut pending, depth, marker.take());
                }
                pending.clear();
                self.block(child, depth);
            } else {
                collect_inline(child, false, false, &mut pending);
            }
        }
        self.flush(&mut pending, depth, marker.take());
    }

    fn table(&mut self, node: Node, depth: usize) {
        let rows = node
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "tr");
        for row in rows {
            let mut inlines = Vec::new();
            let cells = row
                .children()
                .filter(|n| n.is_element() && matches!(n.tag_name().name(), "td" | "th"));
            for (i, cell) in cells.enumerate() {
                if i > 0 {
                    inlines.push(Inline::Text {
                        text: CELL_SEPARATOR.to_string(),
                        bold: false,
                        mono: false,
                    });
                }
                let bold = cell.tag_name().name() == "th";
                inlines.extend(inline_children(cell, bold));
            }
            self.push_if_text(Block::new(BlockKind::Paragraph, inlines, depth, None));
        }
    }
}

fn inline_children(node: Node, bold: bool) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in node.children() {
        collect_inline(child, bold, false, &mut out);
    }
    out
}

fn collect_inline(node: Node, bold: bool, mono: bool, out: &mut Vec<Inline>) {
    if node.is_text() {
        if let Some(text) = node.text() {
            out.push(Inline::Text {
                text: text.to_string(),
                bold,
                mono,
            });
        }
        return;
    }
    if !node.is_element() {
        return;
    }
    match node.tag_name().name() {
        "br" => out.push(Inline::Break),
        "img" => {
            if let Some(alt) = node.attribute("alt").filter(|a| !a.is_empty()) {
                out.push(Inline::Text {
                    text: format!("[{alt}]"),
                    bold,
                    mono,
                });
            }
        }
        tag => {
            let bold = bold || matches!(tag, "strong" | "b" | "th");
            let mono = mono || matches!(tag, "code" | "kbd" | "tt" | "samp");
            for child in node.children() {
                collect_inline(child, bold, mono, out);
            }
        }
    }
}

/// The faces an HTML box draws with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Faces {
    pub regular: FaceKey,
    pub bold: FaceKey,
    pub mono: FaceKey,
}

impl Faces {
    pub(crate) fn for_base(base: FaceKey) -> Self {
        Self {
            regular: base,
            bold: FontRegistry::bold(base),
            mono: FontRegistry::monospace(base),
        }
    }

    fn pick(&self, bold: bool, mono: bool) -> FaceKey {
        match (bold, mono) {
            (_, true) => self.mono,
            (true, false) => self.bold,
            (false, false) => self.regular,
        }
    }
}

/// A run of text to draw, positioned in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Segment {
    pub x: f32,
    pub baseline: f32,
    pub face: FaceKey,
    pub size: f32,
    pub text: String,
}

/// A horizontal rule from `x0` to `x1` at `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RuleLine {
    pub x0: f32,
    pub x1: f32,
    pub y: f32,
}

#[derive(Debug, Default)]
pub(crate) struct HtmlLayout {
    /// Runs inside the rect; the rest is clipped.
    pub segments: Vec<Segment>,
    pub rules: Vec<RuleLine>,
    /// Every block with text, including those past the bottom of the rect.
    pub blocks: Vec<TextBlock>,
    /// Text of the drawn runs in reading order, list markers left out.
    pub drawn_text: String,
    /// Some line fell past the bottom of the rect.
    pub clipped: bool,
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    face: FaceKey,
    /// Whitespace preceded this piece, so a line may break before it.
    glue: bool,
}

enum Token {
    Piece(Piece),
    Break,
}

#[derive(Debug, Clone)]
struct LineItem {
    x: f32,
    face: FaceKey,
    text: String,
    spaced: bool,
}

#[derive(Debug, Clone, Default)]
struct Line {
    items: Vec<LineItem>,
    width: f32,
}

impl Line {
    fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            if item.spaced {
                out.push(' ');
            }
            out.push_str(&item.text);
        }
        out
    }
}

pub(crate) fn layout_html(
    html: &str,
    css: &str,
    rect: Rect,
    faces: Faces,
    fonts: &mut FontRegistry,
) -> Result<HtmlLayout, ComposerError> {
    let blocks = parse_blocks(html)?;
    let style = HtmlStyle::parse(css);
    let mut layout = HtmlLayout::default();
    let mut cursor = rect.y0;

    for (index, block) in blocks.iter().enumerate() {
        let scale = match block.kind {
            BlockKind::Heading(level) => style.heading_scale[level.clamp(1, 6) - 1],
            BlockKind::Code => style.code_scale,
            _ => 1.0,
        };
        let size = (style.font_size * scale).max(1.0);
        let line_height = size * style.line_height;
        let indent = block.depth as f32 * style.font_size * INDENT_EM;

        if block.kind == BlockKind::Rule {
            let y = cursor + size * 0.5;
            if y <= rect.y1 {
                layout.rules.push(RuleLine {
                    x0: rect.x0 + indent,
                    x1: rect.x1,
                    y,
                });
            }
            cursor += size;
            continue;
        }

        let marker = block.marker.as_deref().map(|m| format!("{m} "));
        let marker_width = marker
            .as_deref()
            .map(|m| fonts.measure(faces.regular, m, size))
            .unwrap_or(0.0);
        let text_x = rect.x0 + indent + marker_width;
        let available = (rect.width() - indent - marker_width).max(size);

        let lines = match block.kind {
            BlockKind::Code => code_lines(block, faces.mono, size, available, fonts),
            _ => {
                let bold = matches!(block.kind, BlockKind::Heading(_));
                wrap_tokens(tokenize(&block.inlines, faces, bold), size, available, fonts)
            }
        };
        if lines.is_empty() {
            continue;
        }

        let top = cursor;
        let mut widest = 0.0f32;
        for (i, line) in lines.iter().enumerate() {
            let line_top = cursor;
            cursor += line_height;
            widest = widest.max(line.width);
            if cursor > rect.y1 + FIT_EPSILON {
                layout.clipped |= !line.items.is_empty();
                continue;
            }
            let baseline = line_top + (line_height - size) / 2.0 + size * 0.8;
            if i == 0 {
                if let Some(marker) = &marker {
                    layout.segments.push(Segment {
                        x: rect.x0 + indent,
                        baseline,
                        face: faces.regular,
                        size,
                        text: marker.trim_end().to_string(),
                    });
                }
            }
            for item in &line.items {
                if !layout.drawn_text.is_empty() {
                    layout.drawn_text.push(' ');
                }
                layout.drawn_text.push_str(&item.text);
                layout.segments.push(Segment {
                    x: text_x + item.x,
                    baseline,
                    face: item.face,
                    size,
                    text: item.text.clone(),
                });
            }
        }

        let text = lines.iter().map(Line::text).collect::<Vec<_>>().join("\n");
        layout.blocks.push(TextBlock {
            bbox: Rect::new(rect.x0 + indent, top, text_x + widest, cursor),
            text: match &marker {
                Some(m) => format!("{m}{text}"),
                None => text,
            },
        });

        let next_is_item = blocks
            .get(index + 1)
            .is_some_and(|next| next.marker.is_some());
        cursor += if block.marker.is_some() && next_is_item {
            style.paragraph_gap * 0.5
        } else {
            style.paragraph_gap
        };
    }
    Ok(layout)
}

/// Splits inline runs into pieces, collapsing whitespace.
fn tokenize(inlines: &[Inline], faces: Faces, force_bold: bool) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<Piece> = None;
    let mut pending_space = false;

    for inline in inlines {
        let (text, face) = match inline {
            Inline::Break => {
                tokens.extend(current.take().map(Token::Piece));
                tokens.push(Token::Break);
                pending_space = false;
                continue;
            }
            Inline::Text { text, bold, mono } => (text, faces.pick(*bold || force_bold, *mono)),
        };
        for ch in text.chars() {
            if ch.is_whitespace() {
                if current.is_some() || !tokens.is_empty() {
                    pending_space = true;
                }
                tokens.extend(current.take().map(Token::Piece));
                continue;
            }
            match &mut current {
                Some(piece) if piece.face == face && !pending_space => piece.text.push(ch),
                _ => {
                    tokens.extend(current.take().map(Token::Piece));
                    current = Some(Piece {
                        text: ch.to_string(),
                        face,
                        glue: pending_space,
                    });
                    pending_space = false;
                }
            }
        }
    }
    tokens.extend(current.map(Token::Piece));
    tokens
}

fn wrap_tokens(tokens: Vec<Token>, size: f32, available: f32, fonts: &mut FontRegistry) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for token in tokens {
        let piece = match token {
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                continue;
            }
            Token::Piece(piece) => piece,
        };
        let width = fonts.measure(piece.face, &piece.text, size);
        let mut space = if piece.glue && !line.items.is_empty() {
            fonts.measure(piece.face, " ", size)
        } else {
            0.0
        };
        if !line.items.is_empty() && piece.glue && line.width + space + width > available {
            lines.push(std::mem::take(&mut line));
            space = 0.0;
        }
        if line.items.is_empty() && width > available {
            let mut chunks = break_chars(&piece.text, piece.face, size, available, fonts);
            let last = chunks.pop();
            for (text, w) in chunks {
                lines.push(Line {
                    items: vec![LineItem {
                        x: 0.0,
                        face: piece.face,
                        text,
                        spaced: false,
                    }],
                    width: w,
                });
            }
            if let Some((text, w)) = last {
                line.items.push(LineItem {
                    x: 0.0,
                    face: piece.face,
                    text,
                    spaced: false,
                });
                line.width = w;
            }
            continue;
        }
        line.items.push(LineItem {
            x: line.width + space,
            face: piece.face,
            text: piece.text,
            spaced: space > 0.0,
        });
        line.width += space + width;
    }
    if !line.items.is_empty() {
        lines.push(line);
    }
    lines
}

fn code_lines(block: &Block, face: FaceKey, size: f32, available: f32, fonts: &mut FontRegistry) -> Vec<Line> {
    let text: String = block
        .inlines
        .iter()
        .filter_map(|i| match i {
            Inline::Text { text, .. } => Some(text.as_str()),
            Inline::Break => None,
        })
        .collect();
    let mut lines = Vec::new();
    for source_line in text.replace('\t', "    ").split('\n') {
        let trimmed = source_line.trim_end();
        if trimmed.is_empty() {
            lines.push(Line::default());
            continue;
        }
        for (chunk, width) in break_chars(trimmed, face, size, available, fonts) {
            lines.push(Line {
                items: vec![LineItem {
                    x: 0.0,
                    face,
                    text: chunk,
                    spaced: false,
                }],
                width,
            });
        }
    }
    lines
}

/// Splits `text` into chunks no wider than `available`, one char minimum.
fn break_chars(text: &str, face: FaceKey, size: f32, available: f32, fonts: &mut FontRegistry) -> Vec<(String, f32)> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut width = 0.0;
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        let w = fonts.measure(face, ch.encode_utf8(&mut buf), size);
        if !chunk.is_empty() && width + w > available {
            chunks.push((std::mem::take(&mut chunk), width));
            width = 0.0;
        }
        chunk.push(ch);
        width += w;
    }
    if !chunk.is_empty() {
        chunks.push((chunk, width));
    }
    chunks
}
