use scraper::{ElementRef, Html, Node};

/// Reduce an HTML page to its visible text, one line per block element.
///
/// Scripts, styles, embedded frames and hidden elements are dropped and runs
/// of whitespace collapse to a single space.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    let mut current = Vec::new();

    collect_text(&document.root_element(), &mut current, &mut lines);
    flush(&mut current, &mut lines);

    lines.join("\n")
}

fn collect_text(element: &ElementRef, current: &mut Vec<String>, lines: &mut Vec<String>) {
    if is_hidden(element) || should_skip_element(element) {
        return;
    }

    let tag_name = element.value().name().to_lowercase();
    if tag_name == "br" {
        flush(current, lines);
        return;
    }

    let block = is_block_element(&tag_name);
    if block {
        flush(current, lines);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let normalized = normalize_whitespace(text);
                if !normalized.is_empty() {
                    current.push(normalized);
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, current, lines);
                }
            }
            _ => {}
        }
    }

    if block {
        flush(current, lines);
    }
}

fn flush(current: &mut Vec<String>, lines: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let merged = current.join(" ");
    current.clear();
    if !merged.trim().is_empty() {
        lines.push(merged);
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    element.value().attr("hidden").is_some()
        || element
            .value()
            .attr("style")
            .map(|s| s.contains("display: none") || s.contains("visibility: hidden"))
            .unwrap_or(false)
}

fn should_skip_element(element: &ElementRef) -> bool {
    matches!(
        element.value().name().to_lowercase().as_str(),
        "script" | "style" | "noscript" | "iframe" | "canvas" | "svg" | "template"
    )
}

fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "title"
            | "tr"
            | "ul"
    )
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
