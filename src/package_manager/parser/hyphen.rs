//! `name-version` 族（nix-env -q）
//!
//! 包名自身可能含有连字符，因此以最后一个连字符为界；
//! 后半段首字符是数字才算版本，否则整行作为包名、版本记为 unknown。

use super::{clean_line, OutputParser};
use crate::package_manager::types::{PackageRecord, ParseMode, UNKNOWN_VERSION};

#[derive(Debug, Clone, Copy, Default)]
pub struct HyphenParser;

pub(crate) fn split_name_version(line: &str) -> (&str, &str) {
    match line.rfind('-') {
        Some(pos) if pos > 0 && line[pos + 1..].starts_with(|c: char| c.is_ascii_digit()) => {
            (&line[..pos], &line[pos + 1..])
        }
        _ => (line, UNKNOWN_VERSION),
    }
}

impl OutputParser for HyphenParser {
    fn parse(&self, raw: &str, manager: &str, mode: ParseMode) -> Vec<PackageRecord> {
        raw.lines()
            .filter_map(|raw_line| {
                let line = clean_line(raw_line);
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let (name, version) = split_name_version(trimmed);
                Some(PackageRecord::new(name, manager, version, mode.default_installed()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(output: &str) -> Vec<PackageRecord> {
        HyphenParser.parse(output, "nix-env", ParseMode::ListInstalled)
    }

    #[test]
    fn test_last_hyphen_splits() {
        let result = parse("readline-8.2.1\ngit-lfs-3.4.0\n");
        assert_eq!(result[0].name, "readline");
        assert_eq!(result[0].version, "8.2.1");
        assert_eq!(result[1].name, "git-lfs");
        assert_eq!(result[1].version, "3.4.0");
    }

    #[test]
    fn test_non_digit_tail_keeps_whole_line() {
        let result = parse("mystery-tool\n");
        assert_eq!(result, vec![PackageRecord::new("mystery-tool", "nix-env", "unknown", true)]);
    }

    #[test]
    fn test_no_hyphen_is_kept() {
        let result = parse("hello\n-9\n\n");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "hello");
        assert_eq!(result[0].version, UNKNOWN_VERSION);
        assert_eq!(result[1].name, "-9");
    }

    #[test]
    fn test_order_matches_input() {
        let result = parse("zlib-1.3\nbash-5.2\nzlib-1.3\n");
        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zlib", "bash", "zlib"]);
    }
}
