//! `name/suite version arch [status]` 族（apt）与 `repo/name version` 族（pacman -Ss / -Qs）
//!
//! 段落格式：包行后面可能跟着缩进的描述行，描述累积到待输出记录上，
//! 直到下一个非缩进行或输入结束才输出。

use super::{clean_line, is_banner, is_indented, OutputParser};
use crate::package_manager::types::{PackageRecord, ParseMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashLayout {
    /// `adduser/noble,now 3.137ubuntu1 all [installed]`
    NameFirst,
    /// `core/linux 6.1.1-1 (base) [installed]`
    RepoFirst,
}

#[derive(Debug, Clone)]
pub struct SlashParser {
    layout: SlashLayout,
    marker: &'static str,
    banners: &'static [&'static str],
}

impl SlashParser {
    pub fn new(layout: SlashLayout, marker: &'static str, banners: &'static [&'static str]) -> Self {
        Self { layout, marker, banners }
    }

    pub fn apt() -> Self {
        Self::new(
            SlashLayout::NameFirst,
            "[installed",
            &["Sorting...", "Full Text Search...", "Listing...", "WARNING:"],
        )
    }

    pub fn pacman() -> Self {
        Self::new(SlashLayout::RepoFirst, "[installed", &[])
    }

    fn parse_package_line(&self, trimmed: &str, manager: &str, mode: ParseMode) -> Option<PackageRecord> {
        let mut fields = trimmed.split_whitespace();
        let head = fields.next()?;
        let version = fields.next()?;
        let slash = head.find('/')?;

        let name = match self.layout {
            SlashLayout::NameFirst => &head[..slash],
            SlashLayout::RepoFirst => &head[slash + 1..],
        };
        if name.is_empty() {
            return None;
        }

        let installed = mode.default_installed() || trimmed.contains(self.marker);
        Some(PackageRecord::new(name, manager, version, installed))
    }
}

impl OutputParser for SlashParser {
    fn parse(&self, raw: &str, manager: &str, mode: ParseMode) -> Vec<PackageRecord> {
        let mut records = Vec::new();
        let mut pending: Option<PackageRecord> = None;

        for raw_line in raw.lines() {
            let line = clean_line(raw_line);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if is_indented(&line) {
                if let Some(record) = pending.as_mut() {
                    if !record.description.is_empty() {
                        record.description.push(' ');
                    }
                    record.description.push_str(trimmed);
                }
                continue;
            }

            if is_banner(trimmed, self.banners) {
                continue;
            }

            if let Some(record) = pending.take() {
                records.push(record);
            }
            pending = self.parse_package_line(trimmed, manager, mode);
        }

        if let Some(record) = pending {
            records.push(record);
        }

        records
    }
}
