use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::filter::{DATE_INPUT_FORMAT, FilterCriteria};

/// An active modal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    /// Date filter input, pre-filled with the active date if any.
    DateFilter { input: String },
}

impl Popup {
    pub fn date_filter(criteria: &FilterCriteria) -> Self {
        let input = criteria
            .date
            .map(|d| d.format(DATE_INPUT_FORMAT).to_string())
            .unwrap_or_default();
        Self::DateFilter { input }
    }

    pub fn title(&self) -> &str {
        match self {
            Popup::DateFilter { .. } => "Filter by date",
        }
    }

    pub fn input(&self) -> &str {
        match self {
            Popup::DateFilter { input } => input,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        match self {
            Popup::DateFilter { input } => {
                if !c.is_control() {
                    input.push(c);
                }
            }
        }
    }

    pub fn handle_backspace(&mut self) {
        match self {
            Popup::DateFilter { input } => {
                input.pop();
            }
        }
    }

    /// Consume the popup and return its trimmed input.
    pub fn confirm(self) -> String {
        match self {
            Popup::DateFilter { input } => input.trim().to_string(),
        }
    }
}

/// Render a popup modal centred on screen.
pub fn render_popup(frame: &mut Frame, popup: &Popup) {
    let area = frame.area();
    let width = area.width.min(50);
    let height = area.height.min(8);
    let popup_area = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup_area);

    let content = vec![
        Line::from(""),
        Line::from("Date (YYYY-MM-DD), empty for any day:"),
        Line::from(format!("> {}\u{2588}", popup.input())),
        Line::from(""),
        Line::from(vec![
            "Enter".into(),
            ": Apply, ".into(),
            "Esc".into(),
            ": Cancel".into(),
        ]),
    ];

    let block = Block::default()
        .title(format!(" {} ", popup.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded);

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
