//! Markdown → ratatui `Text` renderer for the architect's replies.
//!
//! Built on `pulldown_cmark` events: headings, emphasis, inline code, fenced
//! code (syntect-highlighted when the fence names a known language), lists,
//! blockquotes, links and rules. Tables, images and raw HTML are dropped.
//!
//! Replies are re-rendered from scratch on every streamed chunk, so the input
//! is often cut mid-construct (an open ``` fence, half a link). Unterminated
//! blocks render as if closed at end of input. Rendering is pure: the same
//! input always yields the same `Text`.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static CODE_THEME: LazyLock<Option<Theme>> = LazyLock::new(|| {
    ThemeSet::load_defaults()
        .themes
        .remove("base16-ocean.dark")
});

/// Heading palette, H1 → H3 (deeper levels reuse H3).
const SKY_400: Color = Color::Rgb(56, 189, 248);
const SKY_300: Color = Color::Rgb(125, 211, 252);
const SKY_200: Color = Color::Rgb(186, 230, 253);

const GUTTER: Color = Color::DarkGray;
const LINK: Color = Color::Cyan;
/// Ratatui draws `\t` as zero width.
const TAB: &str = "    ";

pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, options) {
        renderer.event(event);
    }
    renderer.finish()
}

enum ListKind {
    Bullet,
    Ordered(u64),
}

/// An open fenced or indented code block.
struct CodeBlock {
    /// `None` when the language is missing or unknown.
    highlighter: Option<HighlightLines<'static>>,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    base_fg: Color,
    /// Inline styles, innermost last. Each entry is already merged with its parent.
    inline: Vec<Style>,
    quote_depth: usize,
    lists: Vec<ListKind>,
    code: Option<CodeBlock>,
    link_dest: Option<String>,
    /// A blank line goes before the next block.
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base_fg,
            inline: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            code: None,
            link_dest: None,
            gap: false,
        }
    }

    fn finish(mut self) -> Text<'static> {
        // Close a fence the stream hasn't terminated yet
        if self.code.is_some() {
            self.end_code();
        }
        Text::from(self.lines)
    }

    fn current_style(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn enter_inline(&mut self, overlay: Style) {
        let merged = self.current_style().patch(overlay);
        self.inline.push(merged);
    }

    fn new_line(&mut self) {
        self.open_line(self.code.is_some());
    }

    /// Starts a new output line, carrying the blockquote / code gutters.
    fn open_line(&mut self, in_code: bool) {
        let gutter = Style::default().fg(GUTTER);
        let depth = self.quote_depth + usize::from(in_code);
        let spans = (0..depth).map(|_| Span::styled("│ ", gutter)).collect::<Vec<_>>();
        self.lines.push(Line::from(spans));
    }

    fn append(&mut self, span: Span<'static>) {
        if self.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.lines.last_mut() {
            line.spans.push(span);
        }
    }

    fn begin_block(&mut self) {
        if self.gap {
            self.gap = false;
            self.new_line();
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.append(Span::styled(
                code.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.begin_block();
                self.new_line();
                self.append(Span::styled("─".repeat(40), Style::default().fg(GUTTER)));
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.begin_block();
                // List items hold their paragraph on the marker line
                if self.lists.is_empty() {
                    self.new_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.begin_block();
                self.new_line();
                self.enter_inline(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.begin_block();
                self.quote_depth += 1;
                self.enter_inline(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                if !self.lines.is_empty() {
                    self.gap = true;
                }
                self.begin_block();
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                self.start_code(lang);
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.begin_block();
                }
                self.lists.push(match first {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Bullet,
                });
            }
            Tag::Item => {
                self.new_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    Some(ListKind::Bullet) | None => format!("{indent}- "),
                };
                self.append(Span::styled(marker, Style::default().fg(GUTTER)));
            }
            Tag::Emphasis => self.enter_inline(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.enter_inline(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.enter_inline(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_dest = Some(dest_url.to_string());
                self.enter_inline(link_style());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = self.lists.is_empty(),
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => self.end_code(),
            TagEnd::List(_) => {
                self.lists.pop();
                self.gap = self.lists.is_empty();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(dest) = self.link_dest.take() {
                    self.append(Span::raw(" ("));
                    self.append(Span::styled(dest, link_style()));
                    self.append(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    fn start_code(&mut self, lang: &str) {
        let border = Style::default().fg(GUTTER);
        self.new_line();
        self.append(Span::styled("╭──", border));
        if !lang.is_empty() {
            self.append(Span::styled(format!(" {lang} "), border.add_modifier(Modifier::BOLD)));
            self.append(Span::styled("──", border));
        }

        let highlighter = match (SYNTAXES.find_syntax_by_token(lang), CODE_THEME.as_ref()) {
            (Some(syntax), Some(theme)) if !lang.is_empty() => {
                Some(HighlightLines::new(syntax, theme))
            }
            _ => None,
        };
        self.code = Some(CodeBlock { highlighter });
    }

    fn end_code(&mut self) {
        self.code = None;
        self.new_line();
        self.append(Span::styled("╰──", Style::default().fg(GUTTER)));
        self.gap = true;
    }

    fn text(&mut self, text: &str) {
        let Some(mut block) = self.code.take() else {
            let style = self.current_style();
            self.append(Span::styled(text.replace('\t', TAB), style));
            return;
        };

        for source_line in LinesWithEndings::from(text) {
            let spans = match block.highlighter.as_mut() {
                Some(hl) => highlight(hl, source_line),
                None => vec![Span::styled(
                    source_line.trim_end_matches('\n').replace('\t', TAB),
                    Style::default().fg(Color::White),
                )],
            };
            self.open_line(true);
            if let Some(line) = self.lines.last_mut() {
                line.spans.extend(spans);
            }
        }
        self.code = Some(block);
    }
}

/// One source line through syntect. Falls back to plain white on error.
fn highlight(hl: &mut HighlightLines<'static>, line: &str) -> Vec<Span<'static>> {
    match hl.highlight_line(line, &SYNTAXES) {
        Ok(ranges) => ranges
            .into_iter()
            .map(|(style, fragment)| {
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                (fg, fragment.trim_end_matches('\n').replace('\t', TAB))
            })
            .filter(|(_, fragment)| !fragment.is_empty())
            .map(|(fg, fragment)| Span::styled(fragment, Style::default().fg(fg)))
            .collect(),
        Err(_) => vec![Span::styled(
            line.trim_end_matches('\n').replace('\t', TAB),
            Style::default().fg(Color::White),
        )],
    }
}

fn link_style() -> Style {
    Style::default().fg(LINK).add_modifier(Modifier::UNDERLINED)
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(SKY_400)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(SKY_300).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(SKY_200).add_modifier(Modifier::BOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    fn span<'a>(text: &'a Text<'_>, needle: &str) -> &'a Span<'a> {
        text.lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == needle)
            .unwrap_or_else(|| panic!("no span {needle:?} in {:?}", plain(text)))
    }

    #[test]
    fn plain_text_uses_base_color() {
        let text = render("hello", Color::Green);
        assert_eq!(plain(&text), vec!["hello"]);
        assert_eq!(span(&text, "hello").style.fg, Some(Color::Green));
    }

    #[test]
    fn emphasis_and_inline_code() {
        let text = render("Use **bold** and `Tenant::find()`", Color::Gray);
        assert!(span(&text, "bold").style.add_modifier.contains(Modifier::BOLD));
        let code = span(&text, "Tenant::find()");
        assert_eq!(code.style.fg, Some(Color::White));
        assert_eq!(code.style.bg, Some(Color::DarkGray));
    }

    #[test]
    fn heading_levels_use_distinct_sky_tones() {
        let text = render("# One\n\n## Two\n\n### Three\n\n#### Four", Color::Gray);
        assert_eq!(span(&text, "One").style.fg, Some(SKY_400));
        assert_eq!(span(&text, "Two").style.fg, Some(SKY_300));
        assert_eq!(span(&text, "Three").style.fg, Some(SKY_200));
        assert_eq!(span(&text, "Four").style.fg, Some(SKY_200));
        assert!(span(&text, "Two").style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let text = render("# Plan\n\nFirst paragraph.\n\nSecond.", Color::Gray);
        assert_eq!(plain(&text), vec!["Plan", "", "First paragraph.", "", "Second."]);
    }

    #[test]
    fn link_shows_text_and_url() {
        let text = render("See [the docs](https://tenancyforlaravel.com/docs).", Color::Gray);
        assert!(plain(&text)[0].contains("the docs (https://tenancyforlaravel.com/docs)"));
        assert!(
            span(&text, "the docs")
                .style
                .add_modifier
                .contains(Modifier::UNDERLINED)
        );
    }

    #[test]
    fn code_block_has_border_structure() {
        let lines = plain(&render("```\nline1\nline2\n```", Color::Gray));
        assert_eq!(lines, vec!["╭──", "│ line1", "│ line2", "╰──"]);
    }

    #[test]
    fn tagged_fence_labels_language_and_highlights() {
        let text = render("```php\n$tenant = Tenant::create();\n```", Color::Gray);
        assert!(plain(&text)[0].contains(" php "));
        let highlighted = text.lines[1]
            .spans
            .iter()
            .any(|s| matches!(s.style.fg, Some(Color::Rgb(..))));
        assert!(highlighted, "expected syntax-highlighted spans");
    }

    #[test]
    fn unknown_language_falls_back_to_plain_code() {
        let text = render("```not-a-language\nsome code\n```", Color::Gray);
        assert_eq!(span(&text, "some code").style.fg, Some(Color::White));
    }

    #[test]
    fn tabs_expanded_to_spaces() {
        let lines = plain(&render("```\n\tindented\n```", Color::Gray));
        assert!(lines.iter().any(|l| l.contains("    indented")));
        assert!(lines.iter().all(|l| !l.contains('\t')));
    }

    #[test]
    fn unterminated_fence_renders_open_block() {
        let text = render("Here is the migration:\n\n```php\nSchema::create('tenants'", Color::Gray);
        let lines = plain(&text);
        assert!(lines.iter().any(|l| l.contains("Schema::create")));
        assert!(lines.last().is_some_and(|l| l.starts_with('╰')));
    }

    #[test]
    fn blockquote_has_gutter() {
        let text = render("> Always verify in staging", Color::Gray);
        assert_eq!(plain(&text), vec!["│ Always verify in staging"]);
        assert!(
            span(&text, "Always verify in staging")
                .style
                .add_modifier
                .contains(Modifier::ITALIC)
        );
    }

    #[test]
    fn lists_get_markers() {
        let lines = plain(&render("- one\n- two\n\n1. first\n2. second", Color::Gray));
        assert!(lines.iter().any(|l| l == "- one"));
        assert!(lines.iter().any(|l| l == "2. second"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let input = "# Plan\n\n1. Install\n2. Configure\n\n> note\n\n```bash\ncomposer require stancl/tenancy\n```";
        assert_eq!(render(input, Color::Gray), render(input, Color::Gray));
    }
}
