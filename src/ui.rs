use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AudioStatus, ModalKind, WritingFocus};
use crate::countdown::fmt_mm_ss;
use crate::paper::Question;
use crate::session::Screen;

const HORIZONTAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let now = Instant::now();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(3), // header: title + timer
                Constraint::Min(1),    // screen body
                Constraint::Length(1), // key hints / loading
            ])
            .split(area);

        render_header(self, now, chunks[0], buf);

        match self.session.screen {
            Screen::Start => render_start(self, chunks[1], buf),
            Screen::Listening => render_listening(self, now, chunks[1], buf),
            Screen::Reading => render_reading(self, chunks[1], buf),
            Screen::Writing => render_writing(self, chunks[1], buf),
            Screen::Ended => render_ended(chunks[1], buf),
        }

        render_footer(self, chunks[2], buf);

        if let Some(modal) = &self.modal {
            render_modal(modal, area, buf);
        }
    }
}

fn render_header(app: &App, now: Instant, area: Rect, buf: &mut Buffer) {
    // The end screen drops the header bar entirely
    if app.session.screen == Screen::Ended {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(14)])
        .split(area);

    let title = Paragraph::new(format!("English Exam — {}", app.session.screen))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    title.render(chunks[0], buf);

    let (text, style) = match &app.countdown {
        Some(cd) => {
            let style = if cd.is_warning(now) {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            (cd.display(now), style)
        }
        None => ("--:--".to_string(), Style::default().add_modifier(Modifier::DIM)),
    };

    let timer = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Time left"));
    timer.render(chunks[1], buf);
}

fn render_footer(app: &App, area: Rect, buf: &mut Buffer) {
    let hint = if app.loading {
        "Loading…".to_string()
    } else if app.session.locked {
        "The test is locked.".to_string()
    } else {
        match app.session.screen {
            Screen::Start => "(enter) start  (esc) quit".to_string(),
            Screen::Listening => {
                if app.audio_status == AudioStatus::Idle {
                    "(p) play audio  (esc) quit".to_string()
                } else {
                    "↑/↓ question  ←/→ or 1-9 answer".to_string()
                }
            }
            Screen::Reading => "↑/↓ question  ←/→ or 1-9 answer  (n) writing".to_string(),
            Screen::Writing => {
                "(tab) gaps/email  ←/→ gap  ↑/↓ word  (enter) place  (ctrl-b) back  (ctrl-s) submit"
                    .to_string()
            }
            Screen::Ended => String::new(),
        }
    };

    Paragraph::new(hint)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .render(area, buf);
}

fn render_start(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to the exam.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("The test has three sections: Listening, Reading and Writing."),
        Line::from("You will have 60 minutes once you start. The listening audio"),
        Line::from("plays exactly once and cannot be paused."),
        Line::from(""),
        Line::from("Press Enter when you are ready to begin."),
    ];

    if let Some(err) = &app.start_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_listening(app: &App, now: Instant, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    match app.audio_status {
        AudioStatus::Idle => {
            Paragraph::new("Press (p) to start the listening audio. You can listen only once.")
                .block(Block::default().borders(Borders::ALL).title("Listening"))
                .render(chunks[0], buf);
        }
        AudioStatus::Playing => {
            let ratio = app.playback.map(|p| p.progress(now)).unwrap_or(0.0);
            Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("NOW PLAYING"))
                .gauge_style(Style::default().fg(Color::Cyan))
                .label("Listening in progress…")
                .ratio(ratio)
                .render(chunks[0], buf);
        }
        AudioStatus::Done => {
            Paragraph::new("Listening complete. Now moving to Reading.")
                .block(Block::default().borders(Borders::ALL).title("Listening completed"))
                .render(chunks[0], buf);
        }
    }

    // Questions only open up once the audio is running
    if app.audio_status != AudioStatus::Idle {
        render_questions(
            &app.paper.listening,
            &app.sheet.listening,
            app.question_cursor,
            "Listening questions",
            chunks[1],
            buf,
        );
    }
}

fn render_reading(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    Paragraph::new(app.paper.reading_passage.as_str())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Reading"))
        .render(chunks[0], buf);

    render_questions(
        &app.paper.reading,
        &app.sheet.reading,
        app.question_cursor,
        "Reading questions",
        chunks[1],
        buf,
    );
}

fn render_questions(
    questions: &[Question],
    selections: &[Option<usize>],
    cursor: usize,
    title: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    let mut lines = Vec::new();
    for (i, q) in questions.iter().enumerate() {
        let marker = if i == cursor { "> " } else { "  " };
        let style = if i == cursor {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}. {}", i + 1, q.text),
            style,
        )));

        let mut choice_spans = vec![Span::raw("     ")];
        for (c, choice) in q.choices.iter().enumerate() {
            let letter = char::from(b'A' + c as u8);
            let chosen = selections.get(i).copied().flatten() == Some(c);
            let style = if chosen {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            choice_spans.push(Span::styled(format!("[{letter}] {choice}  "), style));
        }
        lines.push(Line::from(choice_spans));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(area, buf);
}

fn render_writing(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // gap passage
            Constraint::Length(3), // word bank
            Constraint::Min(3),    // email editor
        ])
        .split(area);

    // Gap passage: segments interleaved with the current assignments
    let mut spans = Vec::new();
    let segments = &app.paper.writing.gap_segments;
    for (i, segment) in segments.iter().enumerate() {
        spans.push(Span::raw(segment.clone()));
        if i + 1 < segments.len() {
            let selected = app.writing_focus == WritingFocus::Gaps && app.gap_cursor == i;
            let (text, mut style) = match app.sheet.gaps.gap_word(i) {
                Some(w) => (
                    format!(" {} ", app.paper.writing.word_bank[w]),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                None => (
                    format!(" ({}) ", i + 1),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            };
            if selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(text, style));
        }
    }
    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Fill the gaps"))
        .render(chunks[0], buf);

    // Word bank: in-use words dim out, the word cursor is highlighted
    let mut bank_spans = Vec::new();
    for (w, word) in app.paper.writing.word_bank.iter().enumerate() {
        let in_use = app.sheet.gaps.word_in_use(w);
        let mut style = if in_use {
            Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
        } else {
            Style::default()
        };
        if app.writing_focus == WritingFocus::Gaps && app.word_cursor == w {
            style = style.add_modifier(Modifier::REVERSED);
        }
        bank_spans.push(Span::styled(format!(" {word} "), style));
        bank_spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(bank_spans))
        .block(Block::default().borders(Borders::ALL).title("Word bank"))
        .render(chunks[1], buf);

    let email_title = if app.writing_focus == WritingFocus::Email {
        "Email (editing)"
    } else {
        "Email (tab to edit)"
    };
    let mut email_lines: Vec<Line> = vec![Line::from(Span::styled(
        app.paper.writing.email_prompt.clone(),
        Style::default().add_modifier(Modifier::ITALIC),
    ))];
    email_lines.push(Line::from(""));
    for l in app.sheet.email_text.split('\n') {
        email_lines.push(Line::from(l.to_string()));
    }
    Paragraph::new(email_lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(email_title))
        .render(chunks[2], buf);
}

fn render_ended(area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "The test has ended.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Your answers have been recorded. You can close this window."),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// Centered blocking dialog over a cleared region.
fn render_modal(modal: &crate::app::Modal, area: Rect, buf: &mut Buffer) {
    let longest = modal
        .message
        .lines()
        .map(|l| l.width())
        .max()
        .unwrap_or(0)
        .max(modal.title.width());
    let width = (longest as u16 + 6).min(area.width.saturating_sub(2)).max(20);
    let height = (modal.message.lines().count() as u16 + 4).min(area.height.saturating_sub(2));

    let popup = centered_rect(width, height, area);
    Clear.render(popup, buf);

    let buttons = match modal.kind {
        ModalKind::Info => "[ OK (enter) ]",
        ModalKind::Confirm(_) => "[ OK (enter) ]   [ Cancel (esc) ]",
    };

    let mut lines: Vec<Line> = modal
        .message
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        buttons,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(modal.title.clone()),
        )
        .render(popup, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Timer label used by the header; exposed for reuse in tests.
pub fn timer_label(remaining_secs: u64) -> String {
    fmt_mm_ss(remaining_secs)
}
