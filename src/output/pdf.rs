//! Multi-page PDF report of a quiz, written with lopdf using the standard Helvetica fonts.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::quiz::QuizDocument;

// US Letter, in points
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const FOOTER_Y: i64 = 40;

const TITLE_SIZE: i64 = 24;
const HEADING_SIZE: i64 = 16;
const BODY_SIZE: i64 = 11;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Render the quiz report; every question lists its four labeled options and marks the correct one
pub fn render_report(quiz: &QuizDocument, generated_at: DateTime<Utc>) -> Result<Vec<u8>, lopdf::Error> {
    let mut layout = PageLayout::new();

    layout.centered(BOLD, TITLE_SIZE, "AI Quiz Generator Report");
    layout.centered(
        REGULAR,
        BODY_SIZE,
        &format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
    );
    layout.space(20);

    layout.paragraph(BOLD, HEADING_SIZE, "Quiz Questions", 0);
    layout.space(6);

    for (i, question) in quiz.quiz.iter().enumerate() {
        layout.keep_together(BODY_SIZE * 7);
        layout.paragraph(
            BOLD,
            BODY_SIZE,
            &format!("Question {}: {}", i + 1, question.question),
            0,
        );

        let correct = question.correct_index();
        for (j, (label, option)) in question.labeled_options().enumerate() {
            let mut line = format!("{}. {}", label, option);
            if correct == Some(j) {
                line.push_str(" (Correct Answer)");
            }
            layout.paragraph(REGULAR, BODY_SIZE, &line, 18);
        }

        layout.space(10);
    }

    layout.into_document()
}

/// Places lines top to bottom, starting a new page when the bottom margin is reached
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn line_height(size: i64) -> i64 {
        size * 14 / 10
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` more points fit on this one
    fn keep_together(&mut self, height: i64) {
        if self.y - height < MARGIN && !self.current.is_empty() {
            self.new_page();
        }
    }

    fn space(&mut self, height: i64) {
        self.y -= height;
    }

    fn text_at(&mut self, font: &str, size: i64, x: i64, text: &str) {
        let height = Self::line_height(size);
        if self.y - height < MARGIN {
            self.new_page();
        }
        self.y -= height;
        let y = self.y;
        self.current.extend(text_ops(font, size, x, y, text));
    }

    fn centered(&mut self, font: &str, size: i64, text: &str) {
        let width = estimate_width(text, size);
        let x = ((PAGE_WIDTH - width) / 2).max(MARGIN);
        self.text_at(font, size, x, text);
    }

    fn paragraph(&mut self, font: &str, size: i64, text: &str, indent: i64) {
        let max_width = PAGE_WIDTH - 2 * MARGIN - indent;
        for line in wrap_text(text, size, max_width) {
            self.text_at(font, size, MARGIN + indent, &line);
        }
    }

    fn into_document(mut self) -> Result<Vec<u8>, lopdf::Error> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }

        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            let footer = format!("Page {} of {}", index + 1, total);
            let x = (PAGE_WIDTH - estimate_width(&footer, 9)) / 2;
            page.extend(text_ops(REGULAR, 9, x, FOOTER_Y, &footer));
        }

        build_document(self.pages)
    }
}

fn text_ops(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn build_document(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary("Helvetica"));
    let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Rough Helvetica advance width in points
fn estimate_width(text: &str, size: i64) -> i64 {
    let units: i64 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' => 250,
            ' ' | 'f' | 't' | 'r' | '(' | ')' | '-' => 330,
            'm' | 'w' | 'M' | 'W' => 830,
            c if c.is_ascii_uppercase() => 680,
            _ => 556,
        })
        .sum();
    units * size / 1000
}

/// Greedy word wrap by estimated width; words wider than a line are split
fn wrap_text(text: &str, size: i64, max_width: i64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if estimate_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let mut piece = String::new();
        for c in word.chars() {
            piece.push(c);
            if estimate_width(&piece, size) > max_width {
                piece.pop();
                lines.push(std::mem::take(&mut piece));
                piece.push(c);
            }
        }
        current = piece;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

/// Encode for the WinAnsi standard fonts; unmappable characters become '?'
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\t' | '\n' | '\r' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
