//! Document shown on first start, before anything was ever saved.

pub const SAMPLE_DOCUMENT: &str = r#"# Welcome to mdpad

Write **Markdown** on the left and watch it render on the right.

## Lists

- Plain bullets
- ~~Strikethrough~~ and `inline code`
- Links like https://commonmark.org become clickable

1. Numbered
2. Lists

- [x] Render tables and task lists
- [ ] Export to PDF

## Tables

| Feature | Status |
|:--------|-------:|
| Tables  |   done |
| Math    |   done |

## Math

Inline math such as $e^{i\pi} + 1 = 0$ sits in the text.

$$
\int_0^1 x^2 \, dx = \frac{1}{3}
$$

## Code

```rust
fn main() {
    println!("hello");
}
```

> Import `.md`, `.txt` or `.docx` files, or start from a clean page.
"#;
