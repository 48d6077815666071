//! Rich-document container (`.docx`) → provisional HTML
//!
//! A `.docx` file is a zip archive of WordprocessingML parts. We read
//! `word/document.xml` plus the optional style, numbering and relationship parts
//! and map the body into plain HTML, which the HTML importer then turns into the IR.
//!
//! Mapped: headings (`Heading1..6`/`Title` styles or outline levels), paragraphs,
//! bold/italic/strike runs, hyperlinks, line breaks, numbered and bulleted lists,
//! tables. Images, footnotes, comments and field codes are dropped or reduced to text.

use crate::error::ImportError;
use crate::render::escape_text;
use roxmltree::{Node, NodeType};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";

/// Convert the bytes of a `.docx` container into provisional HTML.
pub fn docx_to_html(name: &str, bytes: &[u8]) -> Result<String, ImportError> {
    let corrupt = |reason: String| ImportError::CorruptContainer {
        name: name.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(e.to_string()))?;

    let document = read_part(&mut archive, DOCUMENT_PART)
        .map_err(|e| corrupt(e.to_string()))?
        .ok_or_else(|| corrupt(format!("missing {DOCUMENT_PART}")))?;

    // Optional parts: a broken one degrades formatting, it does not fail the import
    let styles = read_part(&mut archive, STYLES_PART)
        .ok()
        .flatten()
        .map(|xml| parse_styles(&xml))
        .unwrap_or_default();
    let numbering = read_part(&mut archive, NUMBERING_PART)
        .ok()
        .flatten()
        .map(|xml| parse_numbering(&xml))
        .unwrap_or_default();
    let links = read_part(&mut archive, RELS_PART)
        .ok()
        .flatten()
        .map(|xml| parse_relationships(&xml))
        .unwrap_or_default();

    let doc = roxmltree::Document::parse(&document)
        .map_err(|e| corrupt(format!("XML parsing error: {e}")))?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.tag_name().name() == "body")
        .ok_or_else(|| corrupt("document has no body".to_string()))?;

    let mut writer = HtmlWriter {
        styles: &styles,
        numbering: &numbering,
        links: &links,
        html: String::new(),
        open_lists: Vec::new(),
    };
    writer.write_blocks(body);
    writer.close_lists(0);

    Ok(writer.html)
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    part: &str,
) -> Result<Option<String>, ZipError> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Attribute lookup by local name, so `w:val` matches whatever prefix the writer chose.
fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.node_type() == NodeType::Element)
}

/// Heading level implied by a paragraph style, keyed by style id.
fn parse_styles(xml: &str) -> HashMap<String, u8> {
    let mut levels = HashMap::new();
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return levels;
    };

    for style in doc.root_element().children().filter(|n| n.tag_name().name() == "style") {
        let Some(id) = attr(style, "styleId") else {
            continue;
        };
        let display_name = child(style, "name").and_then(|n| attr(n, "val")).unwrap_or(id);
        let outline = child(style, "pPr")
            .and_then(|ppr| child(ppr, "outlineLvl"))
            .and_then(|n| attr(n, "val"))
            .and_then(|v| v.parse::<u8>().ok());

        if let Some(level) = heading_level_from_name(display_name)
            .or_else(|| heading_level_from_name(id))
            .or_else(|| outline.filter(|l| *l < 6).map(|l| l + 1))
        {
            levels.insert(id.to_string(), level);
        }
    }

    levels
}

fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let digits = lower.strip_prefix("heading")?.trim();
    match digits.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// Whether each `(numId, ilvl)` pair is an ordered list.
#[derive(Debug, Default)]
struct Numbering {
    ordered: HashMap<(String, u8), bool>,
}

impl Numbering {
    fn is_ordered(&self, num_id: &str, level: u8) -> bool {
        self.ordered
            .get(&(num_id.to_string(), level))
            .copied()
            .unwrap_or(false)
    }
}

fn parse_numbering(xml: &str) -> Numbering {
    let mut numbering = Numbering::default();
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return numbering;
    };
    let root = doc.root_element();

    let mut abstract_formats: HashMap<&str, HashMap<u8, bool>> = HashMap::new();
    for abstract_num in root.children().filter(|n| n.tag_name().name() == "abstractNum") {
        let Some(id) = attr(abstract_num, "abstractNumId") else {
            continue;
        };
        let levels = abstract_num
            .children()
            .filter(|n| n.tag_name().name() == "lvl")
            .filter_map(|lvl| {
                let level = attr(lvl, "ilvl")?.parse::<u8>().ok()?;
                let format = child(lvl, "numFmt").and_then(|n| attr(n, "val")).unwrap_or("bullet");
                Some((level, !matches!(format, "bullet" | "none")))
            })
            .collect();
        abstract_formats.insert(id, levels);
    }

    for num in root.children().filter(|n| n.tag_name().name() == "num") {
        let (Some(num_id), Some(abstract_id)) = (
            attr(num, "numId"),
            child(num, "abstractNumId").and_then(|n| attr(n, "val")),
        ) else {
            continue;
        };
        if let Some(levels) = abstract_formats.get(abstract_id) {
            for (level, ordered) in levels {
                numbering
                    .ordered
                    .insert((num_id.to_string(), *level), *ordered);
            }
        }
    }

    numbering
}

/// Hyperlink targets keyed by relationship id.
fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return HashMap::new();
    };
    doc.root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter(|n| attr(*n, "Type").is_some_and(|t| t.ends_with("/hyperlink")))
        .filter_map(|n| Some((attr(n, "Id")?.to_string(), attr(n, "Target")?.to_string())))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Marks {
    bold: bool,
    italic: bool,
    strike: bool,
}

#[derive(Debug)]
enum Piece {
    Text(String, Marks),
    Break,
    Link(String, Vec<Piece>),
}

struct HtmlWriter<'s> {
    styles: &'s HashMap<String, u8>,
    numbering: &'s Numbering,
    links: &'s HashMap<String, String>,
    html: String,
    /// Open list elements, outermost first; `true` is `<ol>`.
    open_lists: Vec<bool>,
}

impl HtmlWriter<'_> {
    fn write_blocks(&mut self, container: Node) {
        for node in elements(container) {
            match node.tag_name().name() {
                "p" => self.write_paragraph(node),
                "tbl" => {
                    self.close_lists(0);
                    self.write_table(node);
                }
                // Content controls wrap ordinary body content
                "sdt" => {
                    if let Some(content) = child(node, "sdtContent") {
                        self.write_blocks(content);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_paragraph(&mut self, p: Node) {
        let ppr = child(p, "pPr");
        let style = ppr
            .and_then(|n| child(n, "pStyle"))
            .and_then(|n| attr(n, "val"));
        let outline = ppr
            .and_then(|n| child(n, "outlineLvl"))
            .and_then(|n| attr(n, "val"))
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|l| *l < 6)
            .map(|l| l + 1);
        let heading = style
            .and_then(|s| self.styles.get(s).copied().or_else(|| heading_level_from_name(s)))
            .or(outline);
        let num_pr = ppr.and_then(|n| child(n, "numPr"));

        let content = render_pieces(&self.collect_runs(p));

        if let Some(level) = heading {
            self.close_lists(0);
            if !content.trim().is_empty() {
                self.html.push_str(&format!("<h{level}>{content}</h{level}>\n"));
            }
            return;
        }

        if let Some(num_pr) = num_pr {
            let num_id = child(num_pr, "numId").and_then(|n| attr(n, "val"));
            let ilvl = child(num_pr, "ilvl")
                .and_then(|n| attr(n, "val"))
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(0);
            // numId 0 explicitly removes numbering
            if let Some(num_id) = num_id.filter(|id| *id != "0") {
                let ordered = self.numbering.is_ordered(num_id, ilvl);
                self.open_list_at(usize::from(ilvl), ordered);
                self.html.push_str(&format!("<li>{content}</li>\n"));
                return;
            }
        }

        self.close_lists(0);
        if !content.trim().is_empty() {
            self.html.push_str(&format!("<p>{content}</p>\n"));
        }
    }

    fn open_list_at(&mut self, level: usize, ordered: bool) {
        self.close_lists(level + 1);
        if self.open_lists.len() == level + 1 && self.open_lists[level] != ordered {
            self.close_lists(level);
        }
        while self.open_lists.len() <= level {
            let kind = if self.open_lists.len() == level {
                ordered
            } else {
                false
            };
            self.html.push_str(if kind { "<ol>\n" } else { "<ul>\n" });
            self.open_lists.push(kind);
        }
    }

    /// Close open lists until `depth` remain.
    fn close_lists(&mut self, depth: usize) {
        while self.open_lists.len() > depth {
            if let Some(ordered) = self.open_lists.pop() {
                self.html.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            }
        }
    }

    fn write_table(&mut self, tbl: Node) {
        self.html.push_str("<table>\n");
        for (index, row) in elements(tbl).filter(|n| n.tag_name().name() == "tr").enumerate() {
            let tag = if index == 0 { "th" } else { "td" };
            self.html.push_str("<tr>");
            for cell in elements(row).filter(|n| n.tag_name().name() == "tc") {
                let paragraphs: Vec<String> = elements(cell)
                    .filter(|n| n.tag_name().name() == "p")
                    .map(|p| render_pieces(&self.collect_runs(p)))
                    .filter(|html| !html.trim().is_empty())
                    .collect();
                self.html
                    .push_str(&format!("<{tag}>{}</{tag}>", paragraphs.join("<br>")));
            }
            self.html.push_str("</tr>\n");
        }
        self.html.push_str("</table>\n");
    }

    fn collect_runs(&self, container: Node) -> Vec<Piece> {
        let mut pieces = Vec::new();
        for node in elements(container) {
            match node.tag_name().name() {
                "r" => collect_run(node, &mut pieces),
                "hyperlink" => {
                    let target = attr(node, "id")
                        .and_then(|id| self.links.get(id).cloned())
                        .or_else(|| attr(node, "anchor").map(|a| format!("#{a}")));
                    let inner = self.collect_runs(node);
                    match target {
                        Some(url) => pieces.push(Piece::Link(url, inner)),
                        None => pieces.extend(inner),
                    }
                }
                // Tracked insertions, simple fields and smart tags carry ordinary runs
                "ins" | "fldSimple" | "smartTag" | "customXml" => {
                    pieces.extend(self.collect_runs(node))
                }
                "sdt" => {
                    if let Some(content) = child(node, "sdtContent") {
                        pieces.extend(self.collect_runs(content));
                    }
                }
                _ => {}
            }
        }
        pieces
    }
}

fn collect_run(run: Node, pieces: &mut Vec<Piece>) {
    let marks = child(run, "rPr").map(run_marks).unwrap_or_default();

    for node in elements(run) {
        match node.tag_name().name() {
            "t" => {
                if let Some(text) = node.text() {
                    pieces.push(Piece::Text(text.to_string(), marks));
                }
            }
            "tab" => pieces.push(Piece::Text(" ".to_string(), marks)),
            "br" | "cr" => pieces.push(Piece::Break),
            _ => {}
        }
    }
}

fn run_marks(rpr: Node) -> Marks {
    let on = |name: &str| {
        child(rpr, name).is_some_and(|n| {
            !matches!(attr(n, "val"), Some("0") | Some("false") | Some("off") | Some("none"))
        })
    };
    Marks {
        bold: on("b"),
        italic: on("i"),
        strike: on("strike") || on("dstrike"),
    }
}

/// Render pieces as inline HTML, merging neighbouring runs with the same marks.
fn render_pieces(pieces: &[Piece]) -> String {
    let mut html = String::new();
    let mut pending: Option<(String, Marks)> = None;

    for piece in pieces {
        match piece {
            Piece::Text(text, marks) => {
                let same_marks = matches!(&pending, Some((_, current)) if current == marks);
                match pending.as_mut() {
                    Some((buffer, _)) if same_marks => buffer.push_str(text),
                    _ => {
                        flush_text(&mut html, pending.take());
                        pending = Some((text.clone(), *marks));
                    }
                }
            }
            Piece::Break => {
                flush_text(&mut html, pending.take());
                html.push_str("<br>");
            }
            Piece::Link(url, inner) => {
                flush_text(&mut html, pending.take());
                html.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_text(url),
                    render_pieces(inner)
                ));
            }
        }
    }
    flush_text(&mut html, pending);

    html
}

fn flush_text(html: &mut String, pending: Option<(String, Marks)>) {
    let Some((text, marks)) = pending else {
        return;
    };
    // Markers only bind to non-space text, so edge spaces stay outside the tags
    let core = text.trim();
    if core.is_empty() || !(marks.bold || marks.italic || marks.strike) {
        html.push_str(&escape_text(&text));
        return;
    }
    let start = text.len() - text.trim_start().len();
    let end = start + core.len();

    let mut out = escape_text(core);
    if marks.strike {
        out = format!("<del>{out}</del>");
    }
    if marks.italic {
        out = format!("<em>{out}</em>");
    }
    if marks.bold {
        out = format!("<strong>{out}</strong>");
    }
    html.push_str(&escape_text(&text[..start]));
    html.push_str(&out);
    html.push_str(&escape_text(&text[end..]));
}
