//! Manual PDF layout and serialization.
//!
//! Pagination is a running vertical cursor: each wrapped line advances it,
//! and once it would pass the bottom margin a new page starts with the title
//! header re-drawn. The writer then emits the smallest useful PDF: one base
//! font, one content stream per page, a cross-reference table.

use crate::errors::AulaError;

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 50.0;
const LINE_HEIGHT: f64 = 16.0;
const BODY_SIZE: f64 = 11.0;
const HEADER_SIZE: f64 = 15.0;
const MAX_LINE_CHARS: usize = 88;

/// One positioned line of text on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub y: f64,
    pub size: f64,
}

/// Line-based paginator with a running vertical cursor.
pub struct Paginator {
    title: String,
    pages: Vec<Vec<Line>>,
    cursor_y: f64,
}

impl Paginator {
    pub fn new(title: &str) -> Self {
        let mut paginator = Self {
            title: title.to_string(),
            pages: Vec::new(),
            cursor_y: 0.0,
        };
        paginator.start_page(false);
        paginator
    }

    fn start_page(&mut self, continuation: bool) {
        self.pages.push(Vec::new());
        self.cursor_y = PAGE_HEIGHT - MARGIN;

        let header = if continuation {
            format!("{} (cont.)", self.title)
        } else {
            self.title.clone()
        };
        self.place(header, HEADER_SIZE);
        self.cursor_y -= LINE_HEIGHT / 2.0;
    }

    fn place(&mut self, text: String, size: f64) {
        let y = self.cursor_y;
        self.pages
            .last_mut()
            .expect("paginator always holds a page")
            .push(Line { text, y, size });
        self.cursor_y -= LINE_HEIGHT;
    }

    fn push_line(&mut self, text: String) {
        if self.cursor_y - LINE_HEIGHT < MARGIN {
            self.start_page(true);
        }
        self.place(text, BODY_SIZE);
    }

    /// Append body text, wrapping each paragraph at word boundaries.
    pub fn push_text(&mut self, text: &str) {
        for paragraph in text.split('\n') {
            if paragraph.trim().is_empty() {
                self.push_line(String::new());
                continue;
            }
            for line in wrap(paragraph, MAX_LINE_CHARS) {
                self.push_line(line);
            }
        }
    }

    pub fn pages(&self) -> &[Vec<Line>] {
        &self.pages
    }
}

fn wrap(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay out and serialize the given body under the given title.
pub fn export_pdf(title: &str, body: &str) -> Result<Vec<u8>, AulaError> {
    let mut paginator = Paginator::new(title);
    paginator.push_text(body);
    Ok(write_document(paginator.pages()))
}

fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() => escaped.push(c),
            // Helvetica has no glyphs outside WinAnsi; drop to '?' rather
            // than emit broken bytes.
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn page_stream(lines: &[Line]) -> String {
    let mut stream = String::new();
    for line in lines {
        if line.text.is_empty() {
            continue;
        }
        stream.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
            line.size,
            MARGIN,
            line.y,
            escape_pdf_text(&line.text)
        ));
    }
    stream
}

/// Emit the object graph: catalog, page tree, font, then one page object and
/// one content stream per laid-out page, followed by the xref table.
fn write_document(pages: &[Vec<Line>]) -> Vec<u8> {
    let page_count = pages.len();
    let mut objects: Vec<String> = Vec::with_capacity(3 + page_count * 2);

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids: Vec<String> = (0..page_count)
        .map(|index| format!("{} 0 R", 4 + index * 2))
        .collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));

    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (index, lines) in pages.iter().enumerate() {
        let stream = page_stream(lines);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + index * 2
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, object));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));

    out.into_bytes()
}
