use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage,
    PdfSaveOptions, Point, Polygon, PolygonRing, Pt, Rgb, TextItem, WindingOrder,
};
use tracing::debug;

use exam_core::model::{ExamReport, ReviewItem, ReviewOutcome, option_label};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Rough Helvetica advance width as a share of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MM_PER_PT: f32 = 0.3528;

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb {
        r: f32::from(r) / 255.0,
        g: f32::from(g) / 255.0,
        b: f32::from(b) / 255.0,
        icc_profile: None,
    })
}

struct Palette {
    accent: Color,
    text: Color,
    muted: Color,
    correct: Color,
    incorrect: Color,
    unanswered: Color,
    panel: Color,
    rule: Color,
}

impl Palette {
    fn new() -> Self {
        Self {
            accent: rgb(59, 130, 246),
            text: rgb(0, 0, 0),
            muted: rgb(100, 100, 100),
            correct: rgb(34, 197, 94),
            incorrect: rgb(239, 68, 68),
            unanswered: rgb(234, 179, 8),
            panel: rgb(240, 240, 240),
            rule: rgb(210, 210, 210),
        }
    }
}

/// Greedy word wrap to at most `max_chars` per line; longer words are split.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn chars_per_line(width_mm: f32, font_size: f32) -> usize {
    let glyph_mm = font_size * AVG_GLYPH_WIDTH * MM_PER_PT;
    // Truncation is intended: partial glyphs do not fit.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let chars = (width_mm / glyph_mm) as usize;
    chars.max(1)
}

/// Top-down page cursor over printpdf's bottom-up coordinates.
struct Layout {
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Distance from the top edge, in mm.
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: MARGIN,
        }
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.cursor + needed > PAGE_HEIGHT - MARGIN {
            self.pages.push(std::mem::take(&mut self.ops));
            self.cursor = MARGIN;
        }
    }

    fn advance(&mut self, mm: f32) {
        self.cursor += mm;
    }

    fn text(&mut self, x: f32, font: BuiltinFont, size: f32, color: &Color, text: impl Into<String>) {
        let pos = Point::new(Mm(x), Mm(PAGE_HEIGHT - self.cursor));
        self.ops.extend([
            Op::StartTextSection,
            Op::SetTextCursor { pos },
            Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font,
            },
            Op::SetLineHeight { lh: Pt(size * 1.2) },
            Op::SetFillColor { col: color.clone() },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.into())],
                font,
            },
            Op::EndTextSection,
        ]);
    }

    /// Wrapped paragraph starting at the cursor; advances by `leading` per line.
    fn paragraph(&mut self, x: f32, width: f32, size: f32, leading: f32, color: &Color, text: &str) {
        for line in wrap_text(text, chars_per_line(width, size)) {
            self.ensure_space(leading);
            self.text(x, BuiltinFont::Helvetica, size, color, line);
            self.advance(leading);
        }
    }

    fn rule(&mut self, color: &Color) {
        let y = PAGE_HEIGHT - self.cursor;
        self.ops.push(Op::SetOutlineColor { col: color.clone() });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    LinePoint {
                        p: Point::new(Mm(MARGIN), Mm(y)),
                        bezier: false,
                    },
                    LinePoint {
                        p: Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)),
                        bezier: false,
                    },
                ],
                is_closed: false,
            },
        });
    }

    /// Filled box whose top edge sits at the cursor.
    fn panel(&mut self, height: f32, color: &Color) {
        let top = PAGE_HEIGHT - self.cursor;
        let bottom = top - height;
        let corners = [
            (MARGIN, bottom),
            (MARGIN + CONTENT_WIDTH, bottom),
            (MARGIN + CONTENT_WIDTH, top),
            (MARGIN, top),
        ];
        let ring = PolygonRing {
            points: corners
                .iter()
                .map(|(x, y)| LinePoint {
                    p: Point::new(Mm(*x), Mm(*y)),
                    bezier: false,
                })
                .collect(),
        };
        self.ops.push(Op::SetFillColor { col: color.clone() });
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![ring],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

/// Render the results document as A4 PDF bytes.
#[must_use]
pub fn export_pdf(report: &ExamReport) -> Vec<u8> {
    let palette = Palette::new();
    let mut layout = Layout::new();
    let header = &report.exam;
    let score = header.score;

    layout.text(
        PAGE_WIDTH / 2.0 - 30.0,
        BuiltinFont::HelveticaBold,
        24.0,
        &palette.accent,
        "EXAM RESULTS",
    );
    layout.advance(15.0);

    for line in [
        format!("Exam: {}", header.exam_type.display_name()),
        format!("Subject: {}", header.subject_label),
        format!("Difficulty: {}", header.difficulty),
        format!("Date: {}", header.generated_at.format("%Y-%m-%d %H:%M UTC")),
    ] {
        layout.text(MARGIN, BuiltinFont::Helvetica, 12.0, &palette.muted, line);
        layout.advance(7.0);
    }
    layout.advance(8.0);

    layout.panel(30.0, &palette.panel);
    layout.advance(10.0);
    layout.text(
        MARGIN + 5.0,
        BuiltinFont::HelveticaBold,
        16.0,
        &palette.text,
        format!("Score: {}/{} ({}%)", score.correct, score.total, score.percentage),
    );
    layout.advance(10.0);
    layout.text(
        MARGIN + 5.0,
        BuiltinFont::Helvetica,
        12.0,
        &palette.correct,
        format!("[+] Correct: {}", score.correct),
    );
    layout.text(
        MARGIN + 60.0,
        BuiltinFont::Helvetica,
        12.0,
        &palette.incorrect,
        format!("[-] Incorrect: {}", score.incorrect),
    );
    layout.text(
        MARGIN + 115.0,
        BuiltinFont::Helvetica,
        12.0,
        &palette.unanswered,
        format!("[ ] Not answered: {}", score.unanswered),
    );
    layout.advance(20.0);

    if report.has_multiple_subjects() {
        layout.text(
            MARGIN,
            BuiltinFont::HelveticaBold,
            14.0,
            &palette.accent,
            "Subject-wise Performance",
        );
        layout.advance(8.0);
        for stats in &report.subjects {
            layout.ensure_space(7.0);
            let color = match stats.percentage {
                70.. => &palette.correct,
                50..=69 => &palette.unanswered,
                _ => &palette.incorrect,
            };
            layout.text(
                MARGIN + 5.0,
                BuiltinFont::Helvetica,
                11.0,
                color,
                format!(
                    "{}: {}/{} correct ({}%)",
                    stats.subject, stats.correct, stats.total, stats.percentage
                ),
            );
            layout.advance(7.0);
        }
        layout.advance(5.0);
    }

    layout.rule(&palette.rule);
    layout.advance(10.0);

    for item in &report.questions {
        render_question(&mut layout, &palette, report, item);
    }

    let pages: Vec<PdfPage> = layout
        .finish()
        .into_iter()
        .map(|ops| PdfPage::new(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), ops))
        .collect();
    debug!(pages = pages.len(), "rendered results pdf");

    let mut document = PdfDocument::new("Exam Results");
    let mut warnings = Vec::new();
    document
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings)
}

fn render_question(layout: &mut Layout, palette: &Palette, report: &ExamReport, item: &ReviewItem) {
    layout.ensure_space(60.0);

    let heading = format!("Question {}", item.number);
    layout.text(MARGIN, BuiltinFont::HelveticaBold, 14.0, &palette.text, heading.clone());
    if report.exam.exam_type.is_configured() {
        if let Some(subject) = &item.subject {
            let offset = chars_per_line(CONTENT_WIDTH, 14.0).min(heading.len() + 1);
            #[allow(clippy::cast_precision_loss)]
            let x = MARGIN + offset as f32 * 14.0 * AVG_GLYPH_WIDTH * MM_PER_PT + 3.0;
            layout.text(x, BuiltinFont::Helvetica, 9.0, &palette.muted, format!("[{subject}]"));
        }
    }
    let (tag, tag_color) = match item.outcome() {
        ReviewOutcome::Correct => ("[CORRECT]", &palette.correct),
        ReviewOutcome::Incorrect => ("[INCORRECT]", &palette.incorrect),
        ReviewOutcome::NotAnswered => ("[NOT ANSWERED]", &palette.unanswered),
    };
    layout.text(
        PAGE_WIDTH - MARGIN - 35.0,
        BuiltinFont::Helvetica,
        10.0,
        tag_color,
        tag,
    );
    layout.advance(8.0);

    layout.paragraph(MARGIN, CONTENT_WIDTH, 11.0, 6.0, &palette.text, &item.text);
    layout.advance(5.0);

    for (index, option) in item.options.iter().enumerate() {
        layout.ensure_space(7.0);
        let letter = option_label(index);
        let (marker, color) = if index == item.correct {
            ("[+]", &palette.correct)
        } else if item.selected == Some(index) {
            ("[-]", &palette.incorrect)
        } else {
            ("   ", &palette.muted)
        };
        layout.text(
            MARGIN + 5.0,
            BuiltinFont::Helvetica,
            10.0,
            color,
            format!("{marker} {letter}. {option}"),
        );
        layout.advance(6.0);
    }
    layout.advance(5.0);

    layout.ensure_space(15.0);
    layout.text(MARGIN + 5.0, BuiltinFont::Helvetica, 10.0, &palette.muted, "Your Answer:");
    match item.selected {
        Some(selected) => {
            let color = if item.is_correct {
                &palette.correct
            } else {
                &palette.incorrect
            };
            layout.text(MARGIN + 35.0, BuiltinFont::Helvetica, 10.0, color, option_label(selected));
        }
        None => layout.text(
            MARGIN + 35.0,
            BuiltinFont::Helvetica,
            10.0,
            &palette.unanswered,
            "Not Answered",
        ),
    }
    layout.text(MARGIN + 70.0, BuiltinFont::Helvetica, 10.0, &palette.muted, "Correct Answer:");
    layout.text(
        MARGIN + 110.0,
        BuiltinFont::Helvetica,
        10.0,
        &palette.correct,
        option_label(item.correct),
    );
    layout.advance(8.0);

    if let Some(explanation) = &item.explanation {
        layout.ensure_space(20.0);
        layout.text(MARGIN + 5.0, BuiltinFont::Helvetica, 9.0, &palette.accent, "[Explanation]");
        layout.advance(5.0);
        layout.paragraph(MARGIN + 5.0, CONTENT_WIDTH - 10.0, 9.0, 5.0, &palette.muted, explanation);
    }

    layout.advance(5.0);
    layout.ensure_space(5.0);
    layout.rule(&palette.rule);
    layout.advance(10.0);
}
