use super::input::render_input_box;
use super::layout;
use super::state::App;
use super::theme::{BLUE, BRIGHT_WHITE, DESC_DIM, DIM, PINK, SEL_BG};
use crate::package_manager::PackageRecord;
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const KEYS_HELP: &str = "↑↓ PgUp/PgDn 移动 | Enter 安装 | ^X 卸载 | ^U 升级 | Esc 退出";

const MANAGER_WIDTH: usize = 10;
const VERSION_WIDTH: usize = 24;
const STATUS_WIDTH: usize = 10;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());

    let managers: Vec<&str> = app.pm.handles().iter().map(|h| h.name.as_str()).collect();
    let title = if managers.is_empty() {
        "lazyinstaller · no package manager detected".to_string()
    } else {
        format!("lazyinstaller · {}", managers.join(", "))
    };
    layout::render_header(f, &title, chunks[0]);

    render_input_box(f, &app.input, ">", app.search.is_busy(), chunks[1]);
    render_package_table(f, app, chunks[2]);
    layout::render_footer(f, &app.status_line(), KEYS_HELP, chunks[3]);
}

fn render_package_table(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" {} / {} ", app.model.len(), app.model.source_len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let padded = inner.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });
    if padded.height < 2 {
        return;
    }

    let name_width = (padded.width as usize)
        .saturating_sub(MANAGER_WIDTH + VERSION_WIDTH + STATUS_WIDTH + 4)
        .max(8);

    let mut lines = vec![Line::from(Span::styled(
        format!(
            "  {}{}{}{}",
            pad("NAME", name_width + 1),
            pad("MANAGER", MANAGER_WIDTH + 1),
            pad("VERSION", VERSION_WIDTH + 1),
            "STATUS"
        ),
        Style::default().fg(DIM).add_modifier(Modifier::BOLD),
    ))];

    if app.model.is_empty() {
        let hint = if app.loading {
            "  正在加载已安装包列表..."
        } else if app.input.content().is_empty() {
            "  没有可显示的软件包"
        } else {
            "  未找到匹配的包"
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(DIM))));
        f.render_widget(Paragraph::new(lines), padded);
        return;
    }

    let desc_width = padded.width as usize;
    for (selected, record) in app.model.visible() {
        lines.push(package_line(record, selected, name_width));
        if selected {
            lines.extend(description_line(record, desc_width));
        }
    }
    f.render_widget(Paragraph::new(lines), padded);

    let total = app.model.len();
    let visible_height = padded.height.saturating_sub(1) as usize;
    if total > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut state = ScrollbarState::new(total).position(app.model.scroll());
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                horizontal: 0,
                vertical: 1,
            }),
            &mut state,
        );
    }
}

fn package_line(record: &PackageRecord, selected: bool, name_width: usize) -> Line<'static> {
    let cursor = if selected { "> " } else { "  " };
    let status = if record.installed { "installed" } else { "available" };

    let base = if selected {
        Style::default().bg(SEL_BG)
    } else {
        Style::default()
    };
    let (name_style, detail_style) = if selected {
        (
            base.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD),
            base.fg(DESC_DIM),
        )
    } else {
        (base.fg(BLUE), base.fg(Color::White))
    };
    let status_style = if record.installed {
        base.fg(PINK)
    } else {
        base.fg(DIM)
    };

    Line::from(vec![
        Span::styled(cursor, name_style),
        Span::styled(pad(&record.name, name_width + 1), name_style),
        Span::styled(pad(&record.manager, MANAGER_WIDTH + 1), detail_style),
        Span::styled(pad(&record.version, VERSION_WIDTH + 1), detail_style),
        Span::styled(status, status_style),
    ])
}

/// 选中行下方的描述（缩进），没有描述时不占行
fn description_line(record: &PackageRecord, width: usize) -> Option<Line<'static>> {
    if record.description.is_empty() {
        return None;
    }
    Some(Line::from(Span::styled(
        format!("    {}", truncate(&record.description, width.saturating_sub(4))),
        Style::default().bg(SEL_BG).fg(DESC_DIM),
    )))
}

/// 按显示宽度截断，超出时以 `…` 结尾
pub fn truncate(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// 截断后用空格补齐到指定显示宽度
fn pad(s: &str, width: usize) -> String {
    let cell = truncate(s, width.saturating_sub(1));
    let fill = width.saturating_sub(UnicodeWidthStr::width(cell.as_str()));
    format!("{cell}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_by_display_width() {
        assert_eq!(truncate("vim", 5), "vim");
        assert_eq!(truncate("libreoffice", 6), "libre…");
        assert_eq!(truncate("编辑器软件", 5), "编辑…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn test_pad_aligns_columns() {
        assert_eq!(pad("apt", 6), "apt   ");
        assert_eq!(UnicodeWidthStr::width(pad("编辑器", 6).as_str()), 6);
        assert_eq!(pad("flatpak-extra", 8), "flatpa… ");
    }

    #[test]
    fn test_description_line_only_when_present() {
        let mut record = PackageRecord::new("vim", "apt", "9.1", false);
        assert!(description_line(&record, 40).is_none());

        record.description = "Vi IMproved - enhanced vi editor".to_string();
        let line = description_line(&record, 20).unwrap();
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "    Vi IMproved - e…");
        assert_eq!(UnicodeWidthStr::width(text.as_str()), 20);
    }
}
