//! 包管理器静态数据：命令模板与发行版 → 管理器对照表

use super::error::TemplateError;

/// 模板末尾的包名/搜索词占位符
pub const PLACEHOLDER: &str = "{}";

const DPKG_LIST: &str = r"dpkg-query -W '-f=${binary:Package},${Version}\n'";
const RPM_LIST: &str = r"rpm -qa --qf '%{NAME} %{VERSION}-%{RELEASE}\n'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ListInstalled,
    Search,
    Install,
    Uninstall,
    Upgrade,
    UpgradeAll,
    UpdateIndex,
}

impl CommandKind {
    pub fn label(self) -> &'static str {
        match self {
            CommandKind::ListInstalled => "list-installed",
            CommandKind::Search => "search",
            CommandKind::Install => "install",
            CommandKind::Uninstall => "uninstall",
            CommandKind::Upgrade => "upgrade",
            CommandKind::UpgradeAll => "upgrade-all",
            CommandKind::UpdateIndex => "update-index",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandTemplates {
    pub list_installed: Option<&'static str>,
    pub search: Option<&'static str>,
    pub install: Option<&'static str>,
    pub uninstall: Option<&'static str>,
    pub upgrade: Option<&'static str>,
    pub upgrade_all: Option<&'static str>,
    pub update_index: Option<&'static str>,
}

/// 一个已知包管理器的描述
#[derive(Debug, Clone)]
pub struct ManagerSpec {
    /// 管理器名（去重键）
    pub name: &'static str,
    /// 需要在 PATH 中探测的可执行文件
    pub executable: &'static str,
    /// 写进 PackageRecord.manager 的标签，dpkg / dpkg-query 都记为 apt
    pub label: &'static str,
    pub commands: CommandTemplates,
}

impl ManagerSpec {
    pub fn template(&self, kind: CommandKind) -> Option<&'static str> {
        let c = &self.commands;
        match kind {
            CommandKind::ListInstalled => c.list_installed,
            CommandKind::Search => c.search,
            CommandKind::Install => c.install,
            CommandKind::Uninstall => c.uninstall,
            CommandKind::Upgrade => c.upgrade,
            CommandKind::UpgradeAll => c.upgrade_all,
            CommandKind::UpdateIndex => c.update_index,
        }
    }

    pub fn supports(&self, kind: CommandKind) -> bool {
        self.template(kind).is_some()
    }

    /// 展开为 argv
    pub fn command(&self, kind: CommandKind, arg: Option<&str>) -> Result<Vec<String>, TemplateError> {
        let template = self.template(kind).ok_or_else(|| TemplateError::Unsupported {
            manager: self.name.to_string(),
            command: kind.label(),
        })?;
        expand_template(template, arg).map_err(|e| match e {
            TemplateError::MissingArgument { .. } => TemplateError::MissingArgument {
                manager: self.name.to_string(),
                command: kind.label(),
            },
            other => other,
        })
    }
}

/// 按 shell 规则切分模板，并把末尾的 `{}` 替换为参数
///
/// 参数原样代入，只按空白切分，不做额外转义。模板没有占位符时忽略参数。
pub fn expand_template(template: &str, arg: Option<&str>) -> Result<Vec<String>, TemplateError> {
    let mut words = shell_words::split(template).map_err(|source| TemplateError::Malformed {
        template: template.to_string(),
        source,
    })?;

    if words.last().map(String::as_str) == Some(PLACEHOLDER) {
        words.pop();
        let arg = arg.map(str::trim).filter(|a| !a.is_empty()).ok_or_else(|| {
            TemplateError::MissingArgument {
                manager: String::new(),
                command: "",
            }
        })?;
        words.extend(arg.split_whitespace().map(str::to_string));
    }

    Ok(words)
}

/// 发行版 ID（/etc/os-release 中的 ID 字段）→ 首选管理器
const DISTRO_MANAGERS: &[(&str, &str)] = &[
    ("clearlinux", "swupd"),
    // Debian 系
    ("ubuntu", "apt"),
    ("debian", "apt"),
    ("linuxmint", "apt"),
    ("pop", "apt"),
    ("deepin", "apt"),
    ("elementary", "apt"),
    ("raspbian", "apt"),
    ("kali", "apt"),
    ("parrot", "apt"),
    ("aosc", "apt"),
    ("zorin", "apt"),
    ("devuan", "apt"),
    ("bodhi", "apt"),
    ("lxle", "apt"),
    ("sparky", "apt"),
    ("armbian", "apt"),
    ("antix", "apt"),
    ("lite", "apt"),
    ("linuxfx", "apt"),
    ("endless", "flatpak"),
    // Red Hat 系
    ("fedora", "dnf"),
    ("redhat", "dnf"),
    ("rhel", "dnf"),
    ("centos", "dnf"),
    ("rocky", "dnf"),
    ("amzn", "dnf"),
    ("ol", "dnf"),
    ("almalinux", "dnf"),
    ("qubes", "dnf"),
    ("eurolinux", "dnf"),
    ("oracle", "rpm"),
    ("sailfish", "rpm"),
    // Arch 系
    ("arch", "pacman"),
    ("manjaro", "pacman"),
    ("endeavouros", "pacman"),
    ("arcolinux", "pacman"),
    ("garuda", "pacman"),
    ("antergos", "pacman"),
    ("kaos", "pacman"),
    ("archbang", "pacman"),
    ("artix", "pacman"),
    ("alpine", "apk"),
    ("postmarket", "apk"),
    ("opensuse", "zypper"),
    ("opensuse-leap", "zypper"),
    ("opensuse-tumbleweed", "zypper"),
    ("nixos", "nix-env"),
    ("gentoo", "emerge"),
    ("funtoo", "emerge"),
    ("void", "xbps"),
    ("mageia", "urpm"),
    ("slackware", "slackpkg"),
    ("solus", "eopkg"),
    ("openwrt", "opkg"),
    ("nutyx", "cards"),
    ("crux", "prt-get"),
    ("freebsd", "pkg"),
    ("ghostbsd", "pkg"),
    ("android", "pkg"),
    ("haiku", "pkgman"),
];

/// 所有已知包管理器
#[derive(Debug, Clone)]
pub struct ManagerRegistry {
    specs: Vec<ManagerSpec>,
}

impl Default for ManagerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ManagerRegistry {
    pub fn new(specs: Vec<ManagerSpec>) -> Self {
        Self { specs }
    }

    pub fn builtin() -> Self {
        let specs = vec![
            ManagerSpec {
                name: "apt",
                executable: "apt",
                label: "apt",
                commands: CommandTemplates {
                    list_installed: Some(DPKG_LIST),
                    search: Some("apt search --names-only {}"),
                    install: Some("sudo apt install {}"),
                    uninstall: Some("sudo apt remove {}"),
                    upgrade: Some("sudo apt install --only-upgrade {}"),
                    upgrade_all: Some("sudo apt upgrade"),
                    update_index: Some("sudo apt update"),
                },
            },
            ManagerSpec {
                name: "dpkg",
                executable: "dpkg",
                label: "apt",
                commands: CommandTemplates {
                    list_installed: Some(DPKG_LIST),
                    uninstall: Some("sudo dpkg -r {}"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "dpkg-query",
                executable: "dpkg-query",
                label: "apt",
                commands: CommandTemplates {
                    list_installed: Some(DPKG_LIST),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "dnf",
                executable: "dnf",
                label: "dnf",
                commands: CommandTemplates {
                    list_installed: Some(RPM_LIST),
                    install: Some("sudo dnf install {}"),
                    uninstall: Some("sudo dnf remove {}"),
                    upgrade: Some("sudo dnf upgrade {}"),
                    upgrade_all: Some("sudo dnf upgrade"),
                    update_index: Some("sudo dnf makecache"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "yum",
                executable: "yum",
                label: "yum",
                commands: CommandTemplates {
                    list_installed: Some(RPM_LIST),
                    install: Some("sudo yum install {}"),
                    uninstall: Some("sudo yum remove {}"),
                    upgrade: Some("sudo yum update {}"),
                    upgrade_all: Some("sudo yum update"),
                    update_index: Some("sudo yum makecache"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "zypper",
                executable: "zypper",
                label: "zypper",
                commands: CommandTemplates {
                    list_installed: Some(RPM_LIST),
                    install: Some("sudo zypper install {}"),
                    uninstall: Some("sudo zypper remove {}"),
                    upgrade: Some("sudo zypper update {}"),
                    upgrade_all: Some("sudo zypper update"),
                    update_index: Some("sudo zypper refresh"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "pacman",
                executable: "pacman",
                label: "pacman",
                commands: CommandTemplates {
                    list_installed: Some("pacman -Q"),
                    search: Some("pacman -Ss {}"),
                    install: Some("sudo pacman -S {}"),
                    uninstall: Some("sudo pacman -Rns {}"),
                    upgrade: Some("sudo pacman -S {}"),
                    upgrade_all: Some("sudo pacman -Syu"),
                    update_index: Some("sudo pacman -Sy"),
                },
            },
            ManagerSpec {
                name: "snap",
                executable: "snap",
                label: "snap",
                commands: CommandTemplates {
                    list_installed: Some("snap list"),
                    search: Some("snap search {}"),
                    install: Some("sudo snap install {}"),
                    uninstall: Some("sudo snap remove {}"),
                    upgrade: Some("sudo snap refresh {}"),
                    upgrade_all: Some("sudo snap refresh"),
                    update_index: None,
                },
            },
            ManagerSpec {
                name: "flatpak",
                executable: "flatpak",
                label: "flatpak",
                commands: CommandTemplates {
                    list_installed: Some("flatpak list --app --columns=application,version"),
                    search: Some("flatpak search --columns=application,version {}"),
                    install: Some("flatpak install {}"),
                    uninstall: Some("flatpak uninstall {}"),
                    upgrade: Some("flatpak update {}"),
                    upgrade_all: Some("flatpak update"),
                    update_index: None,
                },
            },
            ManagerSpec {
                name: "apk",
                executable: "apk",
                label: "apk",
                commands: CommandTemplates {
                    install: Some("sudo apk add {}"),
                    uninstall: Some("sudo apk del {}"),
                    upgrade: Some("sudo apk upgrade {}"),
                    upgrade_all: Some("sudo apk upgrade"),
                    update_index: Some("sudo apk update"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "xbps",
                executable: "xbps-install",
                label: "xbps",
                commands: CommandTemplates {
                    install: Some("sudo xbps-install {}"),
                    uninstall: Some("sudo xbps-remove {}"),
                    upgrade: Some("sudo xbps-install -u {}"),
                    upgrade_all: Some("sudo xbps-install -Su"),
                    update_index: Some("sudo xbps-install -S"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "emerge",
                executable: "emerge",
                label: "emerge",
                commands: CommandTemplates {
                    install: Some("sudo emerge {}"),
                    uninstall: Some("sudo emerge --deselect {}"),
                    upgrade: Some("sudo emerge --update {}"),
                    upgrade_all: Some("sudo emerge --update --deep @world"),
                    update_index: Some("sudo emerge --sync"),
                    ..Default::default()
                },
            },
            ManagerSpec {
                name: "nix-env",
                executable: "nix-env",
                label: "nix-env",
                commands: CommandTemplates {
                    list_installed: Some("nix-env -q"),
                    search: None,
                    install: Some("nix-env -i {}"),
                    uninstall: Some("nix-env -e {}"),
                    upgrade: Some("nix-env -u {}"),
                    upgrade_all: Some("nix-env -u"),
                    update_index: Some("nix-channel --update"),
                },
            },
            ManagerSpec {
                name: "brew",
                executable: "brew",
                label: "brew",
                commands: CommandTemplates {
                    list_installed: Some("brew list --versions"),
                    search: Some("brew search {}"),
                    install: Some("brew install {}"),
                    uninstall: Some("brew uninstall {}"),
                    upgrade: Some("brew upgrade {}"),
                    upgrade_all: Some("brew upgrade"),
                    update_index: Some("brew update"),
                },
            },
            ManagerSpec {
                name: "port",
                executable: "port",
                label: "macports",
                commands: CommandTemplates {
                    list_installed: Some("port installed active"),
                    search: Some("port search --line {}"),
                    install: Some("sudo port install {}"),
                    uninstall: Some("sudo port uninstall {}"),
                    upgrade: Some("sudo port upgrade {}"),
                    upgrade_all: Some("sudo port upgrade outdated"),
                    update_index: Some("sudo port selfupdate"),
                },
            },
        ];
        Self::new(specs)
    }

    pub fn get(&self, name: &str) -> Option<&ManagerSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[ManagerSpec] {
        &self.specs
    }

    /// 需要探测的可执行文件名；未登记的管理器直接用自身名字
    pub fn executable_for<'a>(&self, name: &'a str) -> &'a str {
        match self.get(name) {
            Some(spec) => spec.executable,
            None => name,
        }
    }

    /// 写进记录里的管理器标签
    pub fn label_for<'a>(&self, name: &'a str) -> &'a str {
        match self.get(name) {
            Some(spec) => spec.label,
            None => name,
        }
    }

    pub fn distro_manager(distro_id: &str) -> Option<&'static str> {
        DISTRO_MANAGERS
            .iter()
            .find(|(id, _)| *id == distro_id)
            .map(|(_, pm)| *pm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_trailing_placeholder() {
        let argv = expand_template("sudo apt install {}", Some("vim")).unwrap();
        assert_eq!(argv, vec!["sudo", "apt", "install", "vim"]);
    }

    #[test]
    fn test_expand_splits_argument_on_whitespace() {
        let argv = expand_template("brew search {}", Some("  foo bar ")).unwrap();
        assert_eq!(argv, vec!["brew", "search", "foo", "bar"]);
    }

    #[test]
    fn test_expand_without_placeholder_ignores_argument() {
        let argv = expand_template("sudo apt upgrade", Some("vim")).unwrap();
        assert_eq!(argv, vec!["sudo", "apt", "upgrade"]);
    }

    #[test]
    fn test_expand_missing_argument() {
        let err = expand_template("pacman -Ss {}", None).unwrap_err();
        assert!(matches!(err, TemplateError::MissingArgument { .. }));
        let err = expand_template("pacman -Ss {}", Some("   ")).unwrap_err();
        assert!(matches!(err, TemplateError::MissingArgument { .. }));
    }

    #[test]
    fn test_dpkg_format_stays_one_argument() {
        let argv = expand_template(DPKG_LIST, None).unwrap();
        assert_eq!(argv.len(), 3);
        assert_eq!(argv[2], r"-f=${binary:Package},${Version}\n");
    }

    #[test]
    fn test_spec_command_reports_manager() {
        let registry = ManagerRegistry::builtin();
        let nix = registry.get("nix-env").unwrap();
        match nix.command(CommandKind::Search, Some("vim")) {
            Err(TemplateError::Unsupported { manager, command }) => {
                assert_eq!(manager, "nix-env");
                assert_eq!(command, "search");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match nix.command(CommandKind::Install, None) {
            Err(TemplateError::MissingArgument { manager, .. }) => assert_eq!(manager, "nix-env"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_executable_and_label_lookup() {
        let registry = ManagerRegistry::builtin();
        assert_eq!(registry.executable_for("xbps"), "xbps-install");
        assert_eq!(registry.executable_for("swupd"), "swupd");
        assert_eq!(registry.label_for("dpkg-query"), "apt");
        assert_eq!(registry.label_for("port"), "macports");
    }

    #[test]
    fn test_distro_lookup() {
        assert_eq!(ManagerRegistry::distro_manager("ubuntu"), Some("apt"));
        assert_eq!(ManagerRegistry::distro_manager("void"), Some("xbps"));
        assert_eq!(ManagerRegistry::distro_manager("plan9"), None);
    }

    #[test]
    fn test_rpm_query_format_stays_one_argument() {
        let argv = expand_template(RPM_LIST, None).unwrap();
        assert_eq!(argv, vec!["rpm", "-qa", "--qf", r"%{NAME} %{VERSION}-%{RELEASE}\n"]);

        let registry = ManagerRegistry::builtin();
        for name in ["dnf", "yum", "zypper"] {
            let argv = registry
                .get(name)
                .unwrap()
                .command(CommandKind::ListInstalled, None)
                .unwrap();
            assert_eq!(argv[0], "rpm", "{name}");
            assert_eq!(argv.len(), 4, "{name}");
        }
    }
}
