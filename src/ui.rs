use std::sync::LazyLock;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use regex::Regex;
use askme_core::ChatRole;
use crate::app::App;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?(?:ul|li|p|strong)>").expect("invalid regex"));

/// Read compiled reply markup back into styled terminal lines.
///
/// Each `<p>` and `<li>` becomes one line, list items get a bullet, and
/// `<strong>` turns bold. Text between tags is unescaped.
pub fn markup_lines(markup: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut bold = false;
    let mut last = 0;

    for tag in RE_TAG.find_iter(markup) {
        push_text(&mut spans, &markup[last..tag.start()], bold);
        last = tag.end();

        match tag.as_str() {
            "<li>" => spans.push(Span::styled("• ", Style::default().fg(Color::Yellow))),
            "<strong>" => bold = true,
            "</strong>" => bold = false,
            "</li>" | "</p>" => lines.push(Line::from(std::mem::take(&mut spans))),
            _ => {}
        }
    }

    push_text(&mut spans, &markup[last..], bold);
    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }

    lines
}

fn push_text(spans: &mut Vec<Span<'static>>, text: &str, bold: bool) {
    if text.is_empty() {
        return;
    }

    let text = unescape_html(text);
    if bold {
        spans.push(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)));
    } else {
        spans.push(Span::raw(text));
    }
}

fn unescape_html(text: &str) -> String {
    // &amp; last, so an escaped entity is not decoded twice
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let last_error = app.engine.last_error();
    let error_height = if last_error.is_some() { 4 } else { 0 };

    // Main layout: header, transcript, error banner, prompt, footer
    let [header_area, chat_area, error_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(error_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if let Some(message) = last_error {
        render_error(&message, frame, error_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " Ask Me Anything ",
            Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.engine.model()), Style::default().fg(Color::DarkGray)),
    ])
    .alignment(Alignment::Center);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let history = app.engine.history();
    let waiting = app.is_waiting();

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let chat_text = if history.is_empty() && !waiting {
        Text::from(Span::styled(
            "Ask me anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &history {
            match msg.role {
                ChatRole::User => {
                    lines.push(
                        Line::from(Span::styled(
                            "You:",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ))
                        .alignment(Alignment::Right),
                    );
                    for line in msg.content.lines() {
                        lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                    }
                    lines.push(Line::default());
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(markup_lines(&msg.content));
                    lines.push(Line::default());
                }
            }
        }

        if waiting {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_error(message: &str, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(
            " Error: ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));

    let banner = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::LightRed))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(banner, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let waiting = app.is_waiting();
    let (title, border_color) = if waiting {
        (" Waiting for reply... ", Color::DarkGray)
    } else {
        (" Message (Enter to send) ", Color::Yellow)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor inside the box by sliding the visible window
    let inner_width = area.width.saturating_sub(2) as usize;
    let offset = app.cursor.saturating_sub(inner_width.saturating_sub(1));

    let content = if app.input.is_empty() {
        Line::from(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(app.input.chars().skip(offset).collect::<String>())
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if !waiting {
        let cursor_x = area.x + 1 + u16::try_from(app.cursor - offset).unwrap_or(0);
        frame.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    let turns = app.engine.history().len();
    if turns > 0 {
        hints.push(Span::styled(
            format!(" {} messages ", turns),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_markup_lines_one_line_per_element() {
        let lines = markup_lines("<ul><li>a</li><li>b</li><p>plain</p></ul>");
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["• a", "• b", "plain"]);
    }

    #[test]
    fn test_markup_lines_bold_span() {
        let lines = markup_lines("<ul><p><strong>Hello</strong> world</p></ul>");
        assert_eq!(lines.len(), 1);

        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, "Hello");
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, " world");
        assert!(!spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_markup_lines_unescapes_text() {
        let lines = markup_lines("<ul><p>&lt;b&gt; &amp;lt; &#39;q&#39;</p></ul>");
        assert_eq!(plain(&lines[0]), "<b> &lt; 'q'");
    }

    #[test]
    fn test_markup_lines_empty_container() {
        assert!(markup_lines("<ul></ul>").is_empty());
    }
}
