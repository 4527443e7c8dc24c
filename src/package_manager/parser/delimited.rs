use super::{clean_line, OutputParser};
use crate::package_manager::types::{PackageRecord, ParseMode};

/// `name<sep>version`，用于 dpkg-query 的自定义格式输出
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    separator: char,
}

impl DelimitedParser {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl OutputParser for DelimitedParser {
    fn parse(&self, raw: &str, manager: &str, mode: ParseMode) -> Vec<PackageRecord> {
        raw.lines()
            .filter_map(|raw_line| {
                let line = clean_line(raw_line);
                let mut parts = line.trim().splitn(2, self.separator);
                let name = parts.next()?.trim();
                let version = parts.next()?.trim();
                if name.is_empty() || version.is_empty() {
                    return None;
                }
                Some(PackageRecord::new(name, manager, version, mode.default_installed()))
            })
            .collect()
    }
}
