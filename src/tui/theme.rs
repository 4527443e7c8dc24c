//! 主题色定义，全局统一使用

use ratatui::style::Color;

/// 包名
pub const BLUE: Color = Color::Rgb(91, 206, 250);
/// 已安装标记
pub const PINK: Color = Color::Rgb(245, 169, 184);
/// 选中行背景色
pub const SEL_BG: Color = Color::Rgb(45, 35, 55);
pub const BRIGHT_WHITE: Color = Color::Rgb(255, 255, 255);
/// 暗灰色（次要信息）
pub const DIM: Color = Color::Rgb(130, 130, 140);
/// 选中行内的次要文字
pub const DESC_DIM: Color = Color::Rgb(180, 180, 190);
