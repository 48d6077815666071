//! HTML serialization (stage 4 of the render pipeline)
//!
//! Pipeline: IR → RcDom → HTML string
//!
//! Typeset MathML is not parsed into the DOM. Each math node leaves a comment
//! placeholder that is replaced by its MathML after serialization.

use crate::error::FormatError;
use crate::ir::nodes::{Alignment, Block, Inline, List, ListItem, Math, Table, Typeset};
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const MATH_PLACEHOLDER: &str = "mdpad-math:";

/// Serialize blocks to an HTML fragment (no surrounding document or container).
pub fn render_blocks(blocks: &[Block]) -> Result<String, FormatError> {
    let mut builder = DomBuilder::default();
    let container = create_element("div", vec![("class", "markdown-body")]);
    for block in blocks {
        builder.append_block(&container, block);
    }

    let html = serialize_children(&container)?;
    Ok(builder.splice_math(html))
}

#[derive(Default)]
struct DomBuilder {
    /// MathML fragments, indexed by their placeholder number.
    math: Vec<String>,
}

impl DomBuilder {
    fn append_block(&mut self, parent: &Handle, block: &Block) {
        match block {
            Block::Heading(heading) => {
                let tag = format!("h{}", heading.level.clamp(1, 6));
                let el = append(parent, create_element(&tag, vec![]));
                self.append_inlines(&el, &heading.content);
            }

            Block::Paragraph(paragraph) => {
                let el = append(parent, create_element("p", vec![]));
                self.append_inlines(&el, &paragraph.content);
            }

            Block::List(list) => self.append_list(parent, list),

            Block::BlockQuote(children) => {
                let el = append(parent, create_element("blockquote", vec![]));
                for child in children {
                    self.append_block(&el, child);
                }
            }

            Block::CodeBlock(code) => {
                let pre = match &code.language {
                    Some(lang) => create_element("pre", vec![("data-language", lang.as_str())]),
                    None => create_element("pre", vec![]),
                };
                let pre = append(parent, pre);
                let class = code.language.as_ref().map(|lang| format!("language-{lang}"));
                let code_el = match &class {
                    Some(class) => create_element("code", vec![("class", class.as_str())]),
                    None => create_element("code", vec![]),
                };
                let code_el = append(&pre, code_el);
                append(&code_el, create_text(&code.code));
            }

            Block::Table(table) => self.append_table(parent, table),

            Block::Math(math) => self.append_math(parent, math),

            Block::ThematicBreak => {
                append(parent, create_element("hr", vec![]));
            }

            Block::Html(raw) => {
                let el = append(parent, create_element("div", vec![("class", "raw-html")]));
                append(&el, create_text(raw));
            }
        }
    }

    fn append_list(&mut self, parent: &Handle, list: &List) {
        let el = if list.ordered {
            let start = list.start.to_string();
            if list.start == 1 {
                create_element("ol", vec![])
            } else {
                create_element("ol", vec![("start", start.as_str())])
            }
        } else {
            create_element("ul", vec![])
        };
        let el = append(parent, el);

        for item in &list.items {
            self.append_item(&el, item, list.tight);
        }
    }

    fn append_item(&mut self, parent: &Handle, item: &ListItem, tight: bool) {
        let li = match item.task {
            Some(_) => create_element("li", vec![("class", "task-list-item")]),
            None => create_element("li", vec![]),
        };
        let li = append(parent, li);

        if let Some(checked) = item.task {
            let mut attrs = vec![("type", "checkbox"), ("disabled", "")];
            if checked {
                attrs.push(("checked", ""));
            }
            append(&li, create_element("input", attrs));
            append(&li, create_text(" "));
        }

        for block in &item.blocks {
            match block {
                Block::Paragraph(paragraph) if tight => self.append_inlines(&li, &paragraph.content),
                other => self.append_block(&li, other),
            }
        }
    }

    fn append_table(&mut self, parent: &Handle, table: &Table) {
        let table_el = append(parent, create_element("table", vec![]));

        if !table.header.is_empty() {
            let thead = append(&table_el, create_element("thead", vec![]));
            let tr = append(&thead, create_element("tr", vec![]));
            for (col, cell) in table.header.iter().enumerate() {
                let th = append(&tr, cell_element("th", table.alignments.get(col)));
                self.append_inlines(&th, &cell.content);
            }
        }

        if !table.rows.is_empty() {
            let tbody = append(&table_el, create_element("tbody", vec![]));
            for row in &table.rows {
                let tr = append(&tbody, create_element("tr", vec![]));
                for (col, cell) in row.iter().enumerate() {
                    let td = append(&tr, cell_element("td", table.alignments.get(col)));
                    self.append_inlines(&td, &cell.content);
                }
            }
        }
    }

    fn append_inlines(&mut self, parent: &Handle, inlines: &[Inline]) {
        for inline in inlines {
            self.append_inline(parent, inline);
        }
    }

    fn append_inline(&mut self, parent: &Handle, inline: &Inline) {
        match inline {
            Inline::Text(text) => {
                append(parent, create_text(text));
            }
            Inline::Strong(children) => {
                let el = append(parent, create_element("strong", vec![]));
                self.append_inlines(&el, children);
            }
            Inline::Emphasis(children) => {
                let el = append(parent, create_element("em", vec![]));
                self.append_inlines(&el, children);
            }
            Inline::Strikethrough(children) => {
                let el = append(parent, create_element("del", vec![]));
                self.append_inlines(&el, children);
            }
            Inline::Code(code) => {
                let el = append(parent, create_element("code", vec![]));
                append(&el, create_text(code));
            }
            Inline::Link {
                url,
                title,
                content,
            } => {
                let mut attrs = vec![("href", url.as_str())];
                if !title.is_empty() {
                    attrs.push(("title", title.as_str()));
                }
                let el = append(parent, create_element("a", attrs));
                self.append_inlines(&el, content);
            }
            Inline::Image { src, alt, title } => {
                let mut attrs = vec![("src", src.as_str()), ("alt", alt.as_str())];
                if !title.is_empty() {
                    attrs.push(("title", title.as_str()));
                }
                append(parent, create_element("img", attrs));
            }
            Inline::Math(math) => self.append_math(parent, math),
            Inline::SoftBreak => {
                append(parent, create_text("\n"));
            }
            Inline::LineBreak => {
                append(parent, create_element("br", vec![]));
            }
            Inline::Html(raw) => {
                append(parent, create_text(raw));
            }
        }
    }

    fn append_math(&mut self, parent: &Handle, math: &Math) {
        let (tag, mode) = if math.display {
            ("div", "math math-display")
        } else {
            ("span", "math math-inline")
        };

        match &math.typeset {
            Some(Typeset::MathMl(mathml)) => {
                let el = append(parent, create_element(tag, vec![("class", mode)]));
                let index = self.math.len();
                self.math.push(mathml.clone());
                append(&el, create_comment(&format!("{MATH_PLACEHOLDER}{index}")));
            }
            Some(Typeset::Error(message)) => {
                let class = format!("{mode} math-error");
                let el = append(
                    parent,
                    create_element(tag, vec![("class", class.as_str()), ("title", message.as_str())]),
                );
                let code = append(&el, create_element("code", vec![]));
                append(&code, create_text(&math.source));
            }
            None => {
                let el = append(parent, create_element(tag, vec![("class", mode)]));
                let delimiter = if math.display { "$$" } else { "$" };
                append(
                    &el,
                    create_text(&format!("{delimiter}{}{delimiter}", math.source)),
                );
            }
        }
    }

    fn splice_math(&self, mut html: String) -> String {
        for (index, mathml) in self.math.iter().enumerate() {
            let placeholder = format!("<!--{MATH_PLACEHOLDER}{index}-->");
            html = html.replacen(&placeholder, mathml, 1);
        }
        html
    }
}

fn cell_element(tag: &str, alignment: Option<&Alignment>) -> Handle {
    let style = match alignment {
        Some(Alignment::Left) => Some("text-align: left"),
        Some(Alignment::Center) => Some("text-align: center"),
        Some(Alignment::Right) => Some("text-align: right"),
        Some(Alignment::None) | None => None,
    };
    match style {
        Some(style) => create_element(tag, vec![("style", style)]),
        None => create_element(tag, vec![]),
    }
}

fn append(parent: &Handle, child: Handle) -> Handle {
    parent.children.borrow_mut().push(child.clone());
    child
}

/// Create an HTML element with attributes
fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

fn create_comment(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Comment {
            contents: text.to_string().into(),
        },
    })
}

/// Serialize the children of a container (the container itself is left out)
fn serialize_children(container: &Handle) -> Result<String, FormatError> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };

    for child in container.children.borrow().iter() {
        let serializable = SerializableHandle::from(child.clone());
        serialize(&mut output, &serializable, opts.clone()).map_err(|e| {
            FormatError::SerializationError(format!("HTML serialization failed: {e}"))
        })?;
        output.push(b'\n');
    }

    String::from_utf8(output)
        .map_err(|e| FormatError::SerializationError(format!("UTF-8 conversion failed: {e}")))
}
