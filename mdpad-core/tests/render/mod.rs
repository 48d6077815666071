//! Render pipeline: Markdown text → IR → HTML

use mdpad_core::ir::nodes::{Block, Inline};
use mdpad_core::render::{Pipeline, RenderOptions};

fn render(md: &str) -> mdpad_core::render::RenderedDocument {
    Pipeline::default().render(md).expect("render should succeed")
}

#[test]
fn test_rendering_is_deterministic() {
    let md = "# T\n\n| a | b |\n|:--|--:|\n| 1 | 2 |\n\n$x^2$ and - [x] done\n";
    assert_eq!(render(md), render(md));
}

#[test]
fn test_heading_level_one() {
    let rendered = render("# Hello");
    match &rendered.document.blocks[..] {
        [Block::Heading(h)] => {
            assert_eq!(h.level, 1);
            assert_eq!(mdpad_core::ir::nodes::plain_text(&h.content), "Hello");
        }
        other => panic!("Expected a single heading, got {other:?}"),
    }
    assert!(rendered.html.contains("<h1>Hello</h1>"));
}

#[test]
fn test_gfm_extensions() {
    let md = "~~gone~~ https://example.com\n\n- [ ] open\n- [x] closed\n\n| l | r |\n|:--|--:|\n| 1 | 2 |\n";
    let html = render(md).html;
    assert!(html.contains("<del>gone</del>"));
    assert!(html.contains(r#"href="https://example.com""#));
    assert_eq!(html.matches(r#"type="checkbox""#).count(), 2);
    assert_eq!(html.matches("checked").count(), 1);
    assert!(html.contains(r#"<td style="text-align: right">2</td>"#));
}

#[test]
fn test_gfm_can_be_disabled() {
    let pipeline = Pipeline::new(RenderOptions {
        gfm: false,
        math: true,
    });
    let html = pipeline.render("~~gone~~\n").unwrap().html;
    assert!(!html.contains("<del>"));
}

#[test]
fn test_inline_and_display_math() {
    let rendered = render("Euler: $e^{i\\pi}$\n\n$$\nx^2\n$$\n");
    assert!(rendered.html.contains("math math-inline"));
    assert!(rendered.html.contains("math math-display"));
    assert!(rendered.html.contains("<math"));
    assert!(matches!(rendered.document.blocks.last(), Some(Block::Math(m)) if m.display));
}

#[test]
fn test_math_fence_becomes_display_math() {
    let rendered = render("```math\n\\frac{1}{2}\n```\n");
    assert!(matches!(&rendered.document.blocks[..], [Block::Math(m)] if m.display));
}

#[test]
fn test_bad_math_does_not_abort_document() {
    let rendered = render("before $\\frac{$ after\n\n# Still here\n");
    assert!(rendered.html.contains("math-error"));
    assert!(rendered.html.contains("<h1>Still here</h1>"));
    assert_eq!(rendered.block_count(), 2);
}

#[test]
fn test_comment_in_math_group_is_marked_not_fatal() {
    for md in ["$x^{%a$\n\n# After\n", "$\\frac{%}$\n\n# After\n", "Price: ${% off$ today\n\n# After\n"] {
        let rendered = render(md);
        assert!(rendered.html.contains("math-error"), "{md}: {}", rendered.html);
        assert!(rendered.html.contains("<h1>After</h1>"), "{md}");
    }
}

#[test]
fn test_math_disabled_keeps_dollars_as_text() {
    let pipeline = Pipeline::new(RenderOptions {
        gfm: true,
        math: false,
    });
    let rendered = pipeline.render("costs $5 and $6\n").unwrap();
    let Some(Block::Paragraph(p)) = rendered.document.blocks.first() else {
        panic!("Expected a paragraph");
    };
    assert!(p.content.iter().all(|i| !matches!(i, Inline::Math(_))));
    assert!(rendered.html.contains("$5"));
}

#[test]
fn test_raw_html_is_escaped() {
    let html = render("<script>alert(1)</script>\n").html;
    assert!(!html.contains("<script>"));
    assert!(html.contains("raw-html"));
}

#[test]
fn test_code_block_language() {
    let html = render("```rust\nfn main() {}\n```\n").html;
    assert!(html.contains(r#"<code class="language-rust">"#));
}

#[test]
fn test_empty_text_renders_nothing() {
    let rendered = render("");
    assert_eq!(rendered.block_count(), 0);
    assert!(rendered.html.is_empty());
}
