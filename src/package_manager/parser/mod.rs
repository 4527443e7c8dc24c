//! 输出解析
//!
//! 每种输出格式是一个独立的解析策略，按 `(管理器, 模式)` 注册。
//! 解析逐行进行、尽力而为：不认识的行直接跳过，解析器本身从不返回错误。

mod columns;
mod delimited;
mod hyphen;
mod slash;

pub use columns::ColumnParser;
pub use delimited::DelimitedParser;
pub use hyphen::HyphenParser;
pub use slash::SlashParser;

use super::types::{PackageRecord, ParseMode};
use std::collections::HashMap;
use std::sync::Arc;

pub trait OutputParser: Send + Sync {
    /// `manager` 是写进记录的标签
    fn parse(&self, raw: &str, manager: &str, mode: ParseMode) -> Vec<PackageRecord>;
}

/// 管理器 → 解析策略
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<(String, ParseMode), Arc<dyn OutputParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        use ParseMode::{ListInstalled, Search};

        let mut registry = Self::new();

        let dpkg: Arc<dyn OutputParser> = Arc::new(DelimitedParser::new(','));
        for name in ["apt", "dpkg", "dpkg-query"] {
            registry.register_shared(name, ListInstalled, dpkg.clone());
        }
        registry.register("apt", Search, SlashParser::apt());

        let rpm: Arc<dyn OutputParser> = Arc::new(ColumnParser::new());
        for name in ["dnf", "yum", "zypper"] {
            registry.register_shared(name, ListInstalled, rpm.clone());
        }

        registry.register("pacman", ListInstalled, ColumnParser::new());
        registry.register("pacman", Search, SlashParser::pacman());

        registry.register("snap", ListInstalled, ColumnParser::snap());
        registry.register("snap", Search, ColumnParser::snap());

        registry.register("flatpak", ListInstalled, ColumnParser::flatpak());
        registry.register("flatpak", Search, ColumnParser::flatpak());

        registry.register("nix-env", ListInstalled, HyphenParser);

        registry.register("brew", ListInstalled, ColumnParser::new());
        registry.register("brew", Search, ColumnParser::brew_search());

        registry.register("port", ListInstalled, ColumnParser::port_installed());
        registry.register("port", Search, ColumnParser::port_search());

        registry
    }

    pub fn register<P>(&mut self, manager: &str, mode: ParseMode, parser: P)
    where
        P: OutputParser + 'static,
    {
        self.register_shared(manager, mode, Arc::new(parser));
    }

    pub fn register_shared(&mut self, manager: &str, mode: ParseMode, parser: Arc<dyn OutputParser>) {
        self.parsers.insert((manager.to_string(), mode), parser);
    }

    pub fn get(&self, manager: &str, mode: ParseMode) -> Option<Arc<dyn OutputParser>> {
        self.parsers.get(&(manager.to_string(), mode)).cloned()
    }

    pub fn supports(&self, manager: &str, mode: ParseMode) -> bool {
        self.parsers.contains_key(&(manager.to_string(), mode))
    }

    /// 没有注册策略时返回空
    pub fn parse(&self, manager: &str, label: &str, mode: ParseMode, raw: &str) -> Vec<PackageRecord> {
        match self.get(manager, mode) {
            Some(parser) => parser.parse(raw, label, mode),
            None => {
                log::debug!("no {mode:?} parser registered for {manager}");
                Vec::new()
            }
        }
    }
}

/// 去掉单行中的 ANSI 转义序列和控制字符
pub(crate) fn clean_line(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
}

/// 按字面量或前缀识别工具自带的提示行
pub(crate) fn is_banner(trimmed: &str, banners: &[&str]) -> bool {
    banners.iter().any(|b| trimmed.starts_with(b))
}

pub(crate) fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}
