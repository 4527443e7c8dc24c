//! 空白分列格式：`name version ...`
//!
//! pacman -Q、snap、flatpak、brew、MacPorts 以及 rpm -qa 都属于这一族，
//! 差别只在表头、提示行和版本列的写法上。

use super::{clean_line, is_banner, OutputParser};
use crate::package_manager::types::{PackageRecord, ParseMode, UNKNOWN_VERSION};

#[derive(Debug, Clone)]
pub struct ColumnParser {
    name_col: usize,
    /// None 表示输出里没有版本列
    version_col: Option<usize>,
    /// 表头行第一列的字面量
    header: Option<&'static str>,
    banners: &'static [&'static str],
    /// 版本前缀符号，如 MacPorts 的 `@8.4.0_0`
    version_sigil: Option<char>,
}

impl Default for ColumnParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnParser {
    pub fn new() -> Self {
        Self {
            name_col: 0,
            version_col: Some(1),
            header: None,
            banners: &[],
            version_sigil: None,
        }
    }

    pub fn header(mut self, first_field: &'static str) -> Self {
        self.header = Some(first_field);
        self
    }

    pub fn banners(mut self, banners: &'static [&'static str]) -> Self {
        self.banners = banners;
        self
    }

    pub fn columns(mut self, name_col: usize, version_col: Option<usize>) -> Self {
        self.name_col = name_col;
        self.version_col = version_col;
        self
    }

    pub fn version_sigil(mut self, sigil: char) -> Self {
        self.version_sigil = Some(sigil);
        self
    }

    pub fn snap() -> Self {
        Self::new().header("Name").banners(&["No matching snaps"])
    }

    pub fn flatpak() -> Self {
        Self::new()
            .header("Application")
            .banners(&["No matches found"])
    }

    /// `brew search` 只输出包名，分组标题以 `==>` 开头
    pub fn brew_search() -> Self {
        Self::new()
            .columns(0, None)
            .banners(&["==>", "No formula", "No cask", "Warning:"])
    }

    /// `curl @8.4.0_0+ssl (active)`
    pub fn port_installed() -> Self {
        Self::new()
            .banners(&[
                "The following ports are currently installed",
                "None of the specified ports are installed",
            ])
            .version_sigil('@')
    }

    pub fn port_search() -> Self {
        Self::new().banners(&["No match for"]).version_sigil('@')
    }
}

impl OutputParser for ColumnParser {
    fn parse(&self, raw: &str, manager: &str, mode: ParseMode) -> Vec<PackageRecord> {
        let mut records = Vec::new();

        for raw_line in raw.lines() {
            let line = clean_line(raw_line);
            let trimmed = line.trim();
            if trimmed.is_empty() || is_banner(trimmed, self.banners) {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if self.header.is_some() && fields.first().copied() == self.header {
                continue;
            }

            let Some(name) = fields.get(self.name_col) else {
                continue;
            };
            let version = match self.version_col {
                Some(col) => match fields.get(col) {
                    Some(&v) => {
                        let v = match self.version_sigil {
                            Some(sigil) => v.strip_prefix(sigil).unwrap_or(v),
                            None => v,
                        };
                        if v.is_empty() {
                            continue;
                        }
                        v
                    }
                    None => continue,
                },
                None => UNKNOWN_VERSION,
            };

            records.push(PackageRecord::new(*name, manager, version, mode.default_installed()));
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pacman_query() {
        let output = "pacman 6.0.2-9\nsystemd 255.1-1\n\nbroken\n";
        let result = ColumnParser::new().parse(output, "pacman", ParseMode::ListInstalled);
        assert_eq!(
            result,
            vec![
                PackageRecord::new("pacman", "pacman", "6.0.2-9", true),
                PackageRecord::new("systemd", "pacman", "255.1-1", true),
            ]
        );
    }

    #[test]
    fn test_parse_snap_list_skips_header() {
        let output = "Name    Version   Rev    Tracking       Publisher   Notes\n\
core22  20240111  1122   latest/stable  canonical✓  base\n\
firefox 126.0-2   4336   latest/stable  mozilla✓    -\n";
        let result = ColumnParser::snap().parse(output, "snap", ParseMode::ListInstalled);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1], PackageRecord::new("firefox", "snap", "126.0-2", true));
    }

    #[test]
    fn test_search_mode_defaults_to_not_installed() {
        let output = "Name     Version  Publisher  Notes  Summary\nvlc      3.0.20   videolan✓  -      The ultimate media player\n";
        let result = ColumnParser::snap().parse(output, "snap", ParseMode::Search);
        assert_eq!(result, vec![PackageRecord::new("vlc", "snap", "3.0.20", false)]);
    }

    #[test]
    fn test_parse_port_installed() {
        let output = "The following ports are currently installed:\n  curl @8.4.0_0+ssl (active)\n  zlib @1.3_0 (active)\n";
        let result = ColumnParser::port_installed().parse(output, "macports", ParseMode::ListInstalled);
        assert_eq!(
            result,
            vec![
                PackageRecord::new("curl", "macports", "8.4.0_0+ssl", true),
                PackageRecord::new("zlib", "macports", "1.3_0", true),
            ]
        );
    }

    #[test]
    fn test_parse_brew_search_names_only() {
        let output = "==> Formulae\nripgrep\nripgrep-all\n\n==> Casks\nripgrep-gui\n";
        let result = ColumnParser::brew_search().parse(output, "brew", ParseMode::Search);
        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ripgrep", "ripgrep-all", "ripgrep-gui"]);
        assert!(result.iter().all(|r| r.version == UNKNOWN_VERSION && !r.installed));
    }

    #[test]
    fn test_flatpak_no_matches_banner() {
        let output = "No matches found\n";
        assert!(ColumnParser::flatpak()
            .parse(output, "flatpak", ParseMode::Search)
            .is_empty());
    }

    #[test]
    fn test_parse_flatpak_list_skips_header() {
        let output = "Application                     Version\n\
org.mozilla.firefox             128.0.3\n\
org.gimp.GIMP                   2.10.38\n";
        let result = ColumnParser::flatpak().parse(output, "flatpak", ParseMode::ListInstalled);
        assert_eq!(
            result,
            vec![
                PackageRecord::new("org.mozilla.firefox", "flatpak", "128.0.3", true),
                PackageRecord::new("org.gimp.GIMP", "flatpak", "2.10.38", true),
            ]
        );
    }

    #[test]
    fn test_parse_port_search_line_output() {
        let output = "vim\t@9.1.0_0\teditors\tVi \"workalike\" with many additional features\n\
vim-app\t@9.1.0_0\teditors aqua\tMacVim\n\
No match for nothing found\n";
        let result = ColumnParser::port_search().parse(output, "macports", ParseMode::Search);
        assert_eq!(
            result,
            vec![
                PackageRecord::new("vim", "macports", "9.1.0_0", false),
                PackageRecord::new("vim-app", "macports", "9.1.0_0", false),
            ]
        );
    }
}
