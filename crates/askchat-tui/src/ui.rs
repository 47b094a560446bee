use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use askchat_core::ChatRole;
use unicode_width::UnicodeWidthChar;
use crate::app::App;

const SIDEBAR_WIDTH: u16 = 30;

const NEW_CHAT_LABEL: &str = "+ 新しいチャット";
const USER_LABEL: &str = "ユーザー";
const WELCOME_TITLE: &str = "こんにちは、Geminiです";
const WELCOME_SUBTITLE: &str = "今日はどのようにお手伝いしましょうか？";
const INPUT_PLACEHOLDER: &str = "メッセージを入力してください";
const TYPING_INDICATOR: &str = "入力中";
const DISCLAIMER: &str = "Geminiは不正確な情報を表示することがあります。回答内容をよく確認してください。";

/// Static history shown in the sidebar
const HISTORY: [&str; 5] = [
    "機械学習とは何ですか？",
    "量子コンピューティングについて説明して",
    "Reactのベストプラクティス",
    "Pythonの学習方法",
    "AIの倫理について教えて",
];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if end == 0 {
            // "****" is not bold text
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &after[2..];
            continue;
        }
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after[..end].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_sidebar(frame, sidebar_area);
    render_main(app, frame, main_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" askchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint.as_str(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (status, status_style) = if app.is_busy() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut spans = vec![
        Span::styled(status, status_style),
        Span::raw(" "),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];
    if !app.follow_tail {
        spans.push(Span::styled(" (scrolled) ", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_sidebar(frame: &mut Frame, area: Rect) {
    let [button_area, history_area, profile_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let button = Paragraph::new(NEW_CHAT_LABEL)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::Blue).bold())
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Blue)));
    frame.render_widget(button, button_area);

    let items: Vec<ListItem> = HISTORY
        .iter()
        .map(|title| ListItem::new(format!(" {}", title)))
        .collect();
    let history = List::new(items)
        .style(Style::default().fg(Color::Gray))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(history, history_area);

    let profile = Paragraph::new(Line::from(vec![
        Span::styled("● ", Style::default().fg(Color::Magenta)),
        Span::raw(USER_LABEL),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(profile, profile_area);
}

fn render_main(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area, disclaimer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(area);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);

    let disclaimer = Paragraph::new(DISCLAIMER)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(disclaimer, disclaimer_area);
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            ChatRole::User => {
                for line in msg.content.lines() {
                    lines.push(
                        Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Cyan)))
                            .alignment(Alignment::Right),
                    );
                }
            }
            ChatRole::Assistant => {
                let mut content = msg.content.lines();
                let first = content.next().unwrap_or_default();
                let mut line = parse_markdown_line(first);
                line.spans.insert(0, Span::styled("◆ ", Style::default().fg(Color::Magenta)));
                lines.push(line);
                for rest in content {
                    let mut line = parse_markdown_line(rest);
                    line.spans.insert(0, Span::raw("  "));
                    lines.push(line);
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_busy() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(vec![
            Span::styled("◆ ", Style::default().fg(Color::Magenta)),
            Span::styled(
                format!("{}{}", TYPING_INDICATOR, dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    lines
}

/// Rows the lines take once wrapped at `width`, using the chat view's own wrapping
fn wrapped_height(lines: &[Line<'static>], width: u16) -> u16 {
    let rows = Paragraph::new(Text::from(lines.to_vec()))
        .wrap(Wrap { trim: false })
        .line_count(width);
    rows.min(u16::MAX as usize) as u16
}

/// The part of the input that fits in `width` columns with the cursor visible.
///
/// Returns the visible text and the cursor's column within it. Both are
/// measured in display columns, so full-width characters count twice.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    let widths: Vec<usize> = text.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // One column stays free for the cursor itself
    let room = width.saturating_sub(1);
    let mut offset = 0;
    let mut cursor_x: usize = widths[..cursor].iter().sum();
    while cursor_x > room && offset < cursor {
        cursor_x -= widths[offset];
        offset += 1;
    }

    let mut used = 0;
    let visible = text
        .chars()
        .zip(&widths)
        .skip(offset)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, cursor_x)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    if app.conversation.messages().is_empty() && !app.is_busy() {
        app.chat_max_scroll = 0;
        app.chat_scroll = 0;

        let top_padding = area.height.saturating_sub(2 + 3) / 2;
        let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::default()).collect();
        lines.push(Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(WELCOME_SUBTITLE, Style::default().fg(Color::Gray))));

        let welcome = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(welcome, area);
        return;
    }

    let lines = chat_lines(app);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.chat_max_scroll = wrapped_height(&lines, inner_width).saturating_sub(inner_height);
    if app.follow_tail || app.chat_scroll > app.chat_max_scroll {
        app.chat_scroll = app.chat_max_scroll;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let border_color = if busy { Color::DarkGray } else { Color::Yellow };

    // Send hint mirrors the disabled state of a send button
    let send_style = if app.conversation.state().can_submit() {
        Style::default().fg(Color::White).bg(Color::Blue).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title_bottom(Line::from(Span::styled(" ➤ Enter ", send_style)).right_aligned());

    let input_text = app.conversation.pending_input();

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(input_text, app.input_cursor, inner_width);

    let input = if input_text.is_empty() {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if !busy {
        frame.set_cursor_position((area.x + 1 + cursor_x as u16, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askchat_core::{AnswerClient, Conversation};
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app() -> App {
        let endpoint = "http://127.0.0.1:9/ask";
        App::new(Conversation::new(AnswerClient::new(endpoint)), endpoint)
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            let mut x = 0;
            while x < buffer.area.width {
                let symbol = buffer[(x, y)].symbol();
                out.push_str(symbol);
                // A wide character covers the cells after it
                let width: usize = symbol.chars().map(|c| c.width().unwrap_or(0)).sum();
                x += width.max(1) as u16;
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let line = parse_markdown_line("no **close");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "no **close");
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 20), 3);

        // Full-width characters never straddle a row: five of them in five
        // columns take three rows, not two
        let lines = vec![Line::from("あいうえお")];
        assert_eq!(wrapped_height(&lines, 5), 3);
    }

    #[test]
    fn test_input_window_ascii() {
        assert_eq!(input_window("hello", 5, 10), ("hello".to_string(), 5));

        let (visible, cursor_x) = input_window("abcdefghij", 10, 5);
        assert_eq!(visible, "ghij");
        assert_eq!(cursor_x, 4);
    }

    #[test]
    fn test_input_window_counts_display_width() {
        let text = "あ".repeat(40);

        let (visible, cursor_x) = input_window(&text, 40, 49);
        assert_eq!(cursor_x, 48);
        assert_eq!(visible.chars().count(), 24);

        let (visible, cursor_x) = input_window(&text, 3, 49);
        assert_eq!(cursor_x, 6);
        assert_eq!(visible.chars().count(), 24);
    }

    #[test]
    fn test_cursor_stays_in_input_box_with_wide_text() {
        let mut app = test_app();
        for _ in 0..40 {
            app.insert_char('あ');
        }

        let mut terminal = Terminal::new(TestBackend::new(81, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();

        // Input box spans columns 30..81; its inner columns are 31..=79
        assert!(cursor.x >= 31 && cursor.x <= 79, "cursor at {cursor:?}");
    }

    #[test]
    fn test_long_wide_answers_keep_newest_turn_visible() {
        let mut app = test_app();
        for _ in 0..6 {
            let _request = app.conversation.submit("q").unwrap();
            app.conversation.complete(Ok("機械学習は".repeat(40)));
        }
        let _request = app.conversation.submit("LASTQ").unwrap();

        let screen = draw(&mut app, 81, 24);
        assert_eq!(app.chat_scroll, app.chat_max_scroll);
        assert!(screen.contains("LASTQ"), "{screen}");
        assert!(screen.contains(TYPING_INDICATOR), "{screen}");
    }

    #[test]
    fn test_disclaimer_wraps_at_narrow_width() {
        let mut app = test_app();
        let screen = draw(&mut app, 81, 24);
        assert!(screen.contains("Gemini"));
        assert!(screen.contains("ください。"), "{screen}");
    }

    #[test]
    fn test_welcome_shown_when_empty() {
        let mut app = test_app();
        let screen = draw(&mut app, 160, 30);
        assert!(screen.contains("Gemini"));
        assert!(screen.contains("askchat"));
        assert!(screen.contains("Python"));
    }

    #[test]
    fn test_conversation_replaces_welcome() {
        let mut app = test_app();
        let _request = app.conversation.submit("hello").unwrap();
        app.conversation.complete(Ok("hi there".to_string()));

        let screen = draw(&mut app, 160, 30);
        assert!(screen.contains("hello"));
        assert!(screen.contains("hi there"));
        assert!(screen.contains("READY"));
        // Only the disclaimer mentions Gemini once the welcome is gone
        assert_eq!(screen.matches("Gemini").count(), 1);
    }

    #[test]
    fn test_busy_status_and_follow_tail() {
        let mut app = test_app();
        for i in 0..20 {
            let _request = app.conversation.submit(&format!("question {i}")).unwrap();
            app.conversation.complete(Ok(format!("answer {i}")));
        }
        let _request = app.conversation.submit("last question").unwrap();

        let screen = draw(&mut app, 160, 20);
        assert!(screen.contains("WAITING"));
        assert!(screen.contains("last question"));
        assert!(!screen.contains("◆ answer 0 "));
        assert!(app.chat_max_scroll > 0);
        assert_eq!(app.chat_scroll, app.chat_max_scroll);
    }
}
