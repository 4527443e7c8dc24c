use super::theme::DIM;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Header(3) + 输入框(3) + 列表(弹性) + Footer(3)
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

pub fn render_header(f: &mut Frame, title: &str, area: Rect) {
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

/// 左侧状态，右侧快捷键提示
pub fn render_footer(f: &mut Frame, status: &str, keys: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let status = Paragraph::new(Line::from(Span::styled(
        format!(" {status}"),
        Style::default().fg(Color::Green),
    )));
    f.render_widget(status, inner);

    let keys = Paragraph::new(Line::from(Span::styled(
        format!("{keys} "),
        Style::default().fg(DIM),
    )))
    .alignment(Alignment::Right);
    f.render_widget(keys, inner);
}

/// 列表区域可见行数：总高度减去 header / 输入框 / footer / 列表边框与表头，
/// 再留一行给选中项的描述
pub fn visible_list_height(term_height: u16) -> usize {
    term_height.saturating_sub(3 + 3 + 3 + 2 + 1 + 1).max(1) as usize
}
