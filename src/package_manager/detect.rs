//! 包管理器探测
//!
//! 只通过 PATH 查找判断可用性，不启动任何子进程。探测函数可注入，测试时不依赖真实环境。

use super::registry::ManagerRegistry;
use super::types::ManagerHandle;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// (可执行文件, 管理器名)，顺序即探测顺序
const LINUX_PROBES: &[(&str, &str)] = &[
    ("dpkg", "dpkg"),
    ("dpkg-query", "dpkg-query"),
    ("apt", "apt"),
    ("dnf", "dnf"),
    ("pacman", "pacman"),
    ("snap", "snap"),
    ("flatpak", "flatpak"),
    ("zypper", "zypper"),
    ("yum", "yum"),
    ("apk", "apk"),
    ("xbps-install", "xbps"),
    ("emerge", "emerge"),
    ("nix-env", "nix-env"),
    ("brew", "brew"),
    ("port", "port"),
];

const MACOS_PROBES: &[(&str, &str)] = &[("brew", "brew"), ("port", "port"), ("nix-env", "nix-env")];

/// 平台对应的通用探测列表；None 表示该平台没有探测规则
pub fn common_probes(platform: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match platform {
        "linux" => Some(LINUX_PROBES),
        "macos" => Some(MACOS_PROBES),
        _ => None,
    }
}

/// 一次探测的结果，启动时构建一次，之后只读
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub handles: Vec<ManagerHandle>,
    pub diagnostics: Vec<String>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ManagerHandle> {
        self.handles.iter().find(|h| h.name == name)
    }

    /// 第一个探测到的管理器（发行版首选优先）
    pub fn primary(&self) -> Option<&ManagerHandle> {
        self.handles.first()
    }

    /// 去掉配置中禁用的管理器，保持原有顺序
    pub fn without(mut self, disabled: &[String]) -> Self {
        if !disabled.is_empty() {
            self.handles.retain(|h| !disabled.iter().any(|d| d == &h.name));
        }
        self
    }
}

pub struct Detector<'a, P> {
    registry: &'a ManagerRegistry,
    probe: P,
}

impl<'a, P> Detector<'a, P>
where
    P: Fn(&str) -> Option<PathBuf>,
{
    pub fn new(registry: &'a ManagerRegistry, probe: P) -> Self {
        Self { registry, probe }
    }

    pub fn detect(&self, platform: &str, distro_id: Option<&str>) -> Discovery {
        let mut discovery = Discovery::default();

        let Some(probes) = common_probes(platform) else {
            let msg = format!("no package manager probing rules for platform `{platform}`");
            log::warn!("{msg}");
            discovery.diagnostics.push(msg);
            return discovery;
        };

        let mut found: Vec<ManagerHandle> = Vec::new();

        // 发行版首选管理器先探测，去重时它优先于后面的通用探测
        if let Some(id) = distro_id {
            match ManagerRegistry::distro_manager(id) {
                Some(name) => {
                    let exe = self.registry.executable_for(name);
                    match (self.probe)(exe) {
                        Some(path) => found.push(ManagerHandle::new(name, path)),
                        None => log::debug!("distro `{id}` prefers {name}, but `{exe}` is not on PATH"),
                    }
                }
                None => log::debug!("distro `{id}` has no preferred package manager"),
            }
        }

        for (exe, name) in probes {
            if let Some(path) = (self.probe)(exe) {
                found.push(ManagerHandle::new(*name, path));
            }
        }

        discovery.handles = dedup_handles(found);
        log::debug!(
            "detected package managers: {:?}",
            discovery.handles.iter().map(|h| h.name.as_str()).collect::<Vec<_>>()
        );
        discovery
    }
}

/// 按名字去重，保留最先发现的
fn dedup_handles(handles: Vec<ManagerHandle>) -> Vec<ManagerHandle> {
    let mut seen = HashSet::new();
    handles
        .into_iter()
        .filter(|h| seen.insert(h.name.clone()))
        .collect()
}

pub fn which_probe(executable: &str) -> Option<PathBuf> {
    which::which(executable).ok()
}

/// 在当前主机上探测
pub fn detect_host(registry: &ManagerRegistry) -> Discovery {
    let distro_id = read_distro_id(Path::new(OS_RELEASE_PATH));
    Detector::new(registry, which_probe).detect(std::env::consts::OS, distro_id.as_deref())
}

/// 读取 os-release 的 ID 字段；文件或字段不存在都不算错误
pub fn read_distro_id(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    parse_os_release_id(&content)
}

pub fn parse_os_release_id(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("ID=")?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn probe_from(available: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |exe| {
            available
                .iter()
                .any(|a| *a == exe)
                .then(|| PathBuf::from(format!("/usr/bin/{exe}")))
        }
    }

    fn names(discovery: &Discovery) -> Vec<&str> {
        discovery.handles.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_distro_primary_comes_first() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(&registry, probe_from(&["snap", "apt", "dpkg"]));
        let discovery = detector.detect("linux", Some("ubuntu"));
        assert_eq!(names(&discovery), vec!["apt", "dpkg", "snap"]);
    }

    #[test]
    fn test_no_duplicate_names() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(
            &registry,
            probe_from(&["xbps-install", "dpkg", "dpkg-query", "apt", "brew"]),
        );
        let discovery = detector.detect("linux", Some("void"));
        let mut seen = HashSet::new();
        for h in &discovery.handles {
            assert!(seen.insert(h.name.clone()), "duplicate handle {}", h.name);
        }
        assert_eq!(names(&discovery)[0], "xbps");
        assert_eq!(
            discovery.get("xbps").unwrap().executable_path,
            PathBuf::from("/usr/bin/xbps-install")
        );
    }

    #[test]
    fn test_missing_primary_falls_back_to_common() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(&registry, probe_from(&["flatpak"]));
        let discovery = detector.detect("linux", Some("fedora"));
        assert_eq!(names(&discovery), vec!["flatpak"]);
    }

    #[test]
    fn test_unknown_platform_emits_diagnostic() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(&registry, probe_from(&["winget", "choco"]));
        let discovery = detector.detect("windows", None);
        assert!(discovery.is_empty());
        assert_eq!(discovery.diagnostics.len(), 1);
    }

    #[test]
    fn test_macos_rules() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(&registry, probe_from(&["port", "brew", "apt"]));
        let discovery = detector.detect("macos", None);
        assert_eq!(names(&discovery), vec!["brew", "port"]);
    }

    #[test]
    fn test_without_disabled() {
        let registry = ManagerRegistry::builtin();
        let detector = Detector::new(&registry, probe_from(&["pacman", "snap", "flatpak"]));
        let discovery = detector
            .detect("linux", Some("arch"))
            .without(&["snap".to_string()]);
        assert_eq!(names(&discovery), vec!["pacman", "flatpak"]);
        assert_eq!(discovery.primary().unwrap().name, "pacman");
    }

    #[test]
    fn test_parse_os_release_id() {
        let content = "NAME=\"Ubuntu\"\nID_LIKE=debian\nID=ubuntu\nVERSION_ID=\"24.04\"\n";
        assert_eq!(parse_os_release_id(content).as_deref(), Some("ubuntu"));
        assert_eq!(parse_os_release_id("ID=\"fedora\"").as_deref(), Some("fedora"));
        assert_eq!(parse_os_release_id("ID='arch'").as_deref(), Some("arch"));
        assert_eq!(parse_os_release_id("NAME=Foo\nID=\n"), None);
        assert_eq!(parse_os_release_id(""), None);
    }

    #[test]
    fn test_read_distro_id_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PRETTY_NAME=\"Arch Linux\"").unwrap();
        writeln!(file, "ID=arch").unwrap();
        assert_eq!(read_distro_id(file.path()).as_deref(), Some("arch"));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_distro_id(&dir.path().join("missing")), None);
    }
}
