//! Yearly conversation report.
//!
//! A report lists every conversation of one calendar year, oldest first, one
//! entry each: title, date, goal and outcome when present, and the emotional
//! rating. [`layout`] places entries on US Letter pages; the placed pages are
//! then rendered to PDF, and the entries to plain text.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use tracing::info;

use moneytalk_store::{Conversation, Snapshot};

use crate::error::{BackupError, Result};
use crate::font::{self, win_ansi};

// ─────────────────────────────────────────────────────────────────────────────
// Page Geometry (points)
// ─────────────────────────────────────────────────────────────────────────────

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// An entry starting below this line goes to a new page.
const BREAK_LINE: f32 = PAGE_HEIGHT - 300.0;
/// No text is placed below this line.
const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - 40.0;
/// Separators are only drawn above this line.
const SEPARATOR_LIMIT: f32 = PAGE_HEIGHT - 50.0;

const TITLE_GAP: f32 = 30.0;
const ENTRY_GAP: f32 = 40.0;
const SEPARATOR_OFFSET: f32 = 20.0;
const SEPARATOR_GAP: f32 = 10.0;
const LINE_SPACING: f32 = 1.2;

pub const NO_CONVERSATIONS: &str = "No conversations to export for selected year";

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    DocumentTitle,
    EntryTitle,
    Date,
    Body,
}

impl TextStyle {
    pub fn font_size(self) -> f32 {
        match self {
            Self::DocumentTitle => 24.0,
            Self::EntryTitle => 16.0,
            Self::Date | Self::Body => 12.0,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::DocumentTitle | Self::EntryTitle)
    }

    pub fn line_height(self) -> f32 {
        self.font_size() * LINE_SPACING
    }

    /// Width of `text` in points, measured with this style's font.
    pub fn text_width(self, text: &str) -> f32 {
        font::text_width(text, self.is_bold(), self.font_size())
    }
}

/// One conversation as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub title: String,
    /// Abbreviated date and short time, e.g. `Mar 1, 2025 at 6:30 PM`.
    pub date: String,
    pub goal: Option<String>,
    pub outcome: Option<String>,
    pub emotional_rating: i32,
}

impl ReportEntry {
    pub fn from_conversation<Tz>(conversation: &Conversation, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            title: conversation.title.clone(),
            date: conversation
                .date
                .with_timezone(tz)
                .format("%b %-d, %Y at %-I:%M %p")
                .to_string(),
            goal: conversation.goal.clone().filter(|g| !g.is_empty()),
            outcome: conversation.outcome.clone().filter(|o| !o.is_empty()),
            emotional_rating: conversation.emotional_rating,
        }
    }

    /// Logical lines before wrapping. Empty strings are blank lines.
    pub fn lines(&self) -> Vec<(TextStyle, String)> {
        let mut lines = vec![
            (TextStyle::EntryTitle, self.title.clone()),
            (TextStyle::Date, self.date.clone()),
            (TextStyle::Body, String::new()),
        ];
        if let Some(goal) = &self.goal {
            lines.push((TextStyle::Body, format!("Goal: {goal}")));
        }
        if let Some(outcome) = &self.outcome {
            lines.push((TextStyle::Body, format!("Outcome: {outcome}")));
        }
        lines.push((
            TextStyle::Body,
            format!("Emotional Rating: {}/10", self.emotional_rating),
        ));
        lines.push((TextStyle::Body, String::new()));
        lines
    }
}

/// A year's report, laid out.
#[derive(Debug, Clone)]
pub struct YearReport {
    pub year: i32,
    pub title: String,
    pub entries: Vec<ReportEntry>,
    pub pages: Vec<Page>,
}

/// Build the report for `year`, with dates shown in `tz`.
///
/// Fails when the year has no conversations.
pub fn build_year_report<Tz>(snapshot: &Snapshot, year: i32, tz: &Tz) -> Result<YearReport>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let entries: Vec<ReportEntry> = snapshot
        .conversations_in_year(year, tz)
        .into_iter()
        .map(|c| ReportEntry::from_conversation(c, tz))
        .collect();
    if entries.is_empty() {
        return Err(BackupError::Export(NO_CONVERSATIONS.to_string()));
    }

    let title = format!("My Money Conversations {year}");
    let pages = layout(&title, &entries);
    Ok(YearReport {
        year,
        title,
        entries,
        pages,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────────────

/// A run of text at a position measured from the top-left of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub texts: Vec<PlacedText>,
    /// Vertical positions of horizontal rules between entries.
    pub separators: Vec<f32>,
}

/// Place the title and entries on pages.
pub fn layout(title: &str, entries: &[ReportEntry]) -> Vec<Page> {
    let mut pages = vec![Page::default()];
    let mut y = MARGIN;

    for line in wrap(title, TextStyle::DocumentTitle) {
        place(&mut pages, &mut y, TextStyle::DocumentTitle, line);
    }
    y += TITLE_GAP;

    for (index, entry) in entries.iter().enumerate() {
        let lines: Vec<(TextStyle, String)> = entry
            .lines()
            .into_iter()
            .flat_map(|(style, text)| {
                wrap(&text, style)
                    .into_iter()
                    .map(move |line| (style, line))
            })
            .collect();
        let height: f32 = lines.iter().map(|(style, _)| style.line_height()).sum();

        if y > BREAK_LINE || (y > MARGIN && y + height > BOTTOM_LIMIT) {
            pages.push(Page::default());
            y = MARGIN;
        }

        for (style, text) in lines {
            place(&mut pages, &mut y, style, text);
        }
        y += ENTRY_GAP;

        if index + 1 < entries.len() {
            let rule = y - SEPARATOR_OFFSET;
            if rule < SEPARATOR_LIMIT
                && let Some(page) = pages.last_mut()
            {
                page.separators.push(rule);
                y += SEPARATOR_GAP;
            }
        }
    }
    pages
}

fn place(pages: &mut Vec<Page>, y: &mut f32, style: TextStyle, text: String) {
    let height = style.line_height();
    if *y + height > BOTTOM_LIMIT {
        pages.push(Page::default());
        *y = MARGIN;
    }
    if !text.is_empty()
        && let Some(page) = pages.last_mut()
    {
        page.texts.push(PlacedText {
            x: MARGIN,
            y: *y,
            style,
            text,
        });
    }
    *y += height;
}

/// Greedy word wrap to the content width. Words wider than a line are
/// split between characters.
fn wrap(text: &str, style: TextStyle) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let fits = |line: &str| style.text_width(line) <= CONTENT_WIDTH;
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            if !fits(&word) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_word(&word, style);
                word = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }

            if current.is_empty() {
                current = word;
                continue;
            }
            let candidate = format!("{current} {word}");
            if fits(&candidate) {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word));
            }
        }
        lines.push(current);
    }
    lines
}

/// Break one word into pieces that each fit the content width.
fn split_word(word: &str, style: TextStyle) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && style.text_width(&current) > CONTENT_WIDTH {
            current.pop();
            pieces.push(std::mem::replace(&mut current, c.to_string()));
        }
    }
    pieces.push(current);
    pieces
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Document information written into the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub author: String,
    pub creator: String,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            author: "User".to_string(),
            creator: "Money Conversation Manager".to_string(),
        }
    }
}

/// The report as plain text, entries separated by rules.
pub fn render_text(report: &YearReport) -> String {
    let rule = "-".repeat(40);
    let mut out = String::new();
    out.push_str(&report.title);
    out.push_str("\n\n");
    for (index, entry) in report.entries.iter().enumerate() {
        for (_, line) in entry.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        if index + 1 < report.entries.len() {
            out.push_str(&rule);
            out.push_str("\n\n");
        }
    }
    out
}

/// The laid-out report as a PDF document.
pub fn render_pdf(report: &YearReport, meta: &ReportMeta) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids = Vec::with_capacity(report.pages.len());
    for page in &report.pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH as i64),
                Object::Integer(PAGE_HEIGHT as i64),
            ],
        }),
    );

    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info = doc.add_object(dictionary! {
        "Title" => info_string(&report.title),
        "Author" => info_string(&meta.author),
        "Creator" => info_string(&meta.creator),
        "Producer" => info_string("moneytalk"),
    });
    doc.trailer.set("Root", catalog);
    doc.trailer.set("Info", info);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();

    for text in &page.texts {
        let size = text.style.font_size();
        let font = if text.style.is_bold() { "F2" } else { "F1" };
        // PDF space grows upward from the bottom-left corner
        let baseline = PAGE_HEIGHT - text.y - size;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), int(size)],
        ));
        ops.push(Operation::new("Td", vec![int(text.x), int(baseline)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&text.text))],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    if !page.separators.is_empty() {
        ops.push(Operation::new("w", vec![Object::Real(0.5)]));
        ops.push(Operation::new(
            "RG",
            vec![Object::Real(0.8), Object::Real(0.8), Object::Real(0.8)],
        ));
        for rule in &page.separators {
            let y = int(PAGE_HEIGHT - rule);
            ops.push(Operation::new("m", vec![int(MARGIN), y.clone()]));
            ops.push(Operation::new("l", vec![int(PAGE_WIDTH - MARGIN), y]));
            ops.push(Operation::new("S", vec![]));
        }
    }
    ops
}

/// Document info strings: ASCII as is, anything else as UTF-16BE with a BOM.
fn info_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xfe, 0xff];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Literal)
}

fn int(value: f32) -> Object {
    Object::Integer(value.round() as i64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// `MoneyConversations_<year>_<unix-seconds>.pdf`
pub fn report_file_name(year: i32, at: DateTime<Utc>) -> String {
    format!("MoneyConversations_{year}_{}.pdf", at.timestamp())
}

/// Render `report` to PDF and write it into `dir` under the default name.
pub fn write_report(report: &YearReport, meta: &ReportMeta, dir: &Path) -> Result<PathBuf> {
    let bytes = render_pdf(report, meta)?;
    if bytes.is_empty() {
        return Err(BackupError::Export("PDF file is empty".to_string()));
    }
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(report.year, Utc::now()));
    std::fs::write(&path, &bytes)?;
    info!(
        path = %path.display(),
        year = report.year,
        entries = report.entries.len(),
        pages = report.pages.len(),
        bytes = bytes.len(),
        "report written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use moneytalk_store::{ConversationId, Snapshot};

    use super::*;

    fn conversation(title: &str, date: DateTime<Utc>) -> Conversation {
        Conversation {
            id: ConversationId::new(),
            title: title.into(),
            date,
            goal: None,
            outcome: None,
            emotional_rating: 7,
            notes: None,
            is_resolved: false,
            contact_ids: vec![],
            category_id: None,
        }
    }

    fn snapshot_with(conversations: Vec<Conversation>) -> Snapshot {
        Snapshot::new(conversations, vec![], vec![], vec![])
    }

    fn year_of(n: usize) -> Snapshot {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        snapshot_with(
            (0..n)
                .map(|i| conversation(&format!("Entry {i}"), base + Duration::days(i as i64)))
                .collect(),
        )
    }

    #[test]
    fn test_empty_year_is_export_error() {
        let err = build_year_report(&year_of(3), 2019, &Utc).unwrap_err();
        match err {
            BackupError::Export(msg) => assert_eq!(msg, NO_CONVERSATIONS),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_entries_are_chronological_and_filtered() {
        let mut conversations = vec![
            conversation("Late", Utc.with_ymd_and_hms(2025, 11, 2, 9, 0, 0).unwrap()),
            conversation("Early", Utc.with_ymd_and_hms(2025, 2, 2, 9, 0, 0).unwrap()),
            conversation("Other year", Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap()),
        ];
        conversations[0].goal = Some("Ask for a raise".into());
        let report = build_year_report(&snapshot_with(conversations), 2025, &Utc).unwrap();

        let titles: Vec<_> = report.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Late"]);
        assert_eq!(report.title, "My Money Conversations 2025");
        assert_eq!(report.entries[0].date, "Feb 2, 2025 at 9:00 AM");
        assert_eq!(report.entries[1].goal.as_deref(), Some("Ask for a raise"));
    }

    #[test]
    fn test_entry_lines() {
        let entry = ReportEntry {
            title: "Rent".into(),
            date: "Mar 1, 2025 at 6:30 PM".into(),
            goal: None,
            outcome: Some("Split 60/40".into()),
            emotional_rating: 8,
        };
        let texts: Vec<_> = entry.lines().into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            texts,
            [
                "Rent",
                "Mar 1, 2025 at 6:30 PM",
                "",
                "Outcome: Split 60/40",
                "Emotional Rating: 8/10",
                "",
            ]
        );
    }

    #[test]
    fn test_layout_paginates_and_places_each_entry_once() {
        let report = build_year_report(&year_of(12), 2025, &Utc).unwrap();
        assert_eq!(report.pages.len(), 4);

        for i in 0..12 {
            let title = format!("Entry {i}");
            let count = report
                .pages
                .iter()
                .flat_map(|p| &p.texts)
                .filter(|t| t.style == TextStyle::EntryTitle && t.text == title)
                .count();
            assert_eq!(count, 1, "{title}");
        }

        for page in &report.pages {
            for text in &page.texts {
                assert!(text.y >= MARGIN && text.y + text.style.line_height() <= BOTTOM_LIMIT);
            }
        }

        let separators: usize = report.pages.iter().map(|p| p.separators.len()).sum();
        assert_eq!(separators, 11);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("", TextStyle::Body), vec![String::new()]);
        assert_eq!(wrap("one two three", TextStyle::Body), vec!["one two three"]);
        assert_eq!(wrap("a\nb", TextStyle::Body), vec!["a", "b"]);

        // 90 narrow words of "ill " fit on far fewer lines than 90 wide ones
        let narrow = wrap(&["ill"; 90].join(" "), TextStyle::Body);
        let wide = wrap(&["MWM"; 90].join(" "), TextStyle::Body);
        assert!(narrow.len() < wide.len());
        assert_eq!(narrow.join(" "), ["ill"; 90].join(" "));
        assert_eq!(wide.join(" "), ["MWM"; 90].join(" "));
    }

    #[test]
    fn test_wrap_splits_words_wider_than_a_line() {
        let word = "W".repeat(60);
        let lines = wrap(&word, TextStyle::EntryTitle);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(TextStyle::EntryTitle.text_width(line) <= CONTENT_WIDTH);
        }
    }

    #[test]
    fn test_placed_lines_fit_the_page() {
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        let mut caps = conversation(&"W".repeat(52), base);
        caps.goal = Some("WWW MMM ".repeat(40));
        let mut loud = conversation(
            &"SPLITTING THE MORTGAGE WITH MY WHOLE FAMILY NOW".repeat(2),
            base + Duration::days(1),
        );
        loud.outcome = Some("We agreed — “fifty–fifty” — on €1,200/mo. ".repeat(10));
        let report = build_year_report(&snapshot_with(vec![caps, loud]), 2025, &Utc).unwrap();

        let mut placed = 0;
        for text in report.pages.iter().flat_map(|p| &p.texts) {
            let right = text.x + text.style.text_width(&text.text);
            assert!(right <= MARGIN + CONTENT_WIDTH, "{:?} ends at {right}", text.text);
            assert!(right <= PAGE_WIDTH);
            placed += 1;
        }
        assert!(placed > 8);
    }

    #[test]
    fn test_render_text() {
        let report = build_year_report(&year_of(2), 2025, &Utc).unwrap();
        let text = render_text(&report);
        assert!(text.starts_with("My Money Conversations 2025\n\n"));
        assert_eq!(text.matches("Emotional Rating: 7/10").count(), 2);
        assert_eq!(text.matches(&"-".repeat(40)).count(), 1);
    }

    #[test]
    fn test_render_pdf() {
        let report = build_year_report(&year_of(12), 2025, &Utc).unwrap();
        let bytes = render_pdf(&report, &ReportMeta::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 4);

        let needle = b"My Money Conversations 2025";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_pdf_keeps_smart_punctuation() {
        let mut entry = conversation("Rent — “soon”", Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap());
        entry.outcome = Some("I’m owed €500…".into());
        let report = build_year_report(&snapshot_with(vec![entry]), 2025, &Utc).unwrap();
        let bytes = render_pdf(&report, &ReportMeta::default()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page = doc.get_pages().into_values().next().unwrap();
        let content = doc.get_page_content(page).unwrap();
        for needle in [
            &b"Rent \x97 \x93soon\x94"[..],
            &b"Outcome: I\x92m owed \x80500\x85"[..],
        ] {
            assert!(content.windows(needle.len()).any(|w| w == needle));
        }
    }

    #[test]
    fn test_info_strings() {
        assert_eq!(info_string("Dana"), Object::string_literal("Dana"));
        match info_string("Zoë €") {
            Object::String(bytes, _) => assert_eq!(
                bytes,
                vec![0xfe, 0xff, 0x00, b'Z', 0x00, b'o', 0x00, 0xeb, 0x00, b' ', 0x20, 0xac]
            ),
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_report_file_name() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(
            report_file_name(2025, at),
            "MoneyConversations_2025_1700000000.pdf"
        );
    }
}
