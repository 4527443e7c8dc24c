//! 包管理器模块：探测、命令模板、子进程调用与输出解析

pub mod detect;
pub mod error;
pub mod invoke;
pub mod parser;
pub mod registry;
pub mod types;

pub use detect::Discovery;
pub use error::InvocationError;
pub use registry::{CommandKind, ManagerRegistry, ManagerSpec};
pub use types::{dedup_records, ManagerHandle, PackageRecord, ParseMode};

use anyhow::{anyhow, bail, Result};
use futures_util::future::join_all;
use parser::ParserRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 一次已安装清单加载的结果
#[derive(Debug, Default)]
pub struct InventoryLoad {
    pub records: Vec<PackageRecord>,
    /// (管理器名, 失败原因)，只用于日志和状态栏
    pub failures: Vec<(String, InvocationError)>,
}

/// 一条待执行的列表命令，以及共享这条命令的管理器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryJob {
    pub argv: Vec<String>,
    /// 负责解析输出的管理器（第一个使用这条命令的）
    pub manager: String,
    pub label: String,
    pub shared_by: Vec<String>,
}

/// 探测结果与静态数据的组合，启动时构建一次，之后在任务间共享
#[derive(Clone)]
pub struct PackageManager {
    registry: Arc<ManagerRegistry>,
    parsers: Arc<ParserRegistry>,
    discovery: Arc<Discovery>,
}

impl PackageManager {
    /// 在当前主机上探测，并去掉配置中禁用的管理器
    pub fn detect(disabled: &[String]) -> Self {
        let registry = ManagerRegistry::builtin();
        let discovery = detect::detect_host(&registry).without(disabled);
        Self::from_parts(registry, ParserRegistry::builtin(), discovery)
    }

    pub fn from_parts(registry: ManagerRegistry, parsers: ParserRegistry, discovery: Discovery) -> Self {
        Self {
            registry: Arc::new(registry),
            parsers: Arc::new(parsers),
            discovery: Arc::new(discovery),
        }
    }

    pub fn handles(&self) -> &[ManagerHandle] {
        &self.discovery.handles
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.discovery.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.discovery.is_empty()
    }

    /// 发行版首选管理器（若探测到），否则是第一个探测到的
    pub fn primary(&self) -> Option<&ManagerHandle> {
        self.discovery.primary()
    }

    pub fn registry(&self) -> &ManagerRegistry {
        &self.registry
    }

    /// 记录上的标签 → 第一个能执行该命令的已探测管理器
    pub fn manager_for_label(&self, label: &str, kind: CommandKind) -> Option<&str> {
        self.discovery
            .handles
            .iter()
            .filter_map(|h| self.registry.get(&h.name))
            .find(|spec| spec.label == label && spec.supports(kind))
            .map(|spec| spec.name)
    }

    /// 支持搜索的管理器，保持探测顺序
    pub fn searchable(&self) -> Vec<String> {
        self.discovery
            .handles
            .iter()
            .filter(|h| {
                self.registry
                    .get(&h.name)
                    .is_some_and(|spec| spec.supports(CommandKind::Search))
                    && self.parsers.supports(&h.name, ParseMode::Search)
            })
            .map(|h| h.name.clone())
            .collect()
    }

    /// 把已探测管理器的列表命令按 argv 合并
    ///
    /// apt / dpkg / dpkg-query 都跑同一条 dpkg-query，只执行一次。
    pub fn inventory_jobs(&self) -> Vec<InventoryJob> {
        let mut jobs: Vec<InventoryJob> = Vec::new();

        for handle in &self.discovery.handles {
            let Some(spec) = self.registry.get(&handle.name) else {
                continue;
            };
            if !spec.supports(CommandKind::ListInstalled)
                || !self.parsers.supports(&handle.name, ParseMode::ListInstalled)
            {
                continue;
            }
            let argv = match spec.command(CommandKind::ListInstalled, None) {
                Ok(argv) => argv,
                Err(e) => {
                    log::warn!("{}: {e}", handle.name);
                    continue;
                }
            };

            match jobs.iter_mut().find(|j| j.argv == argv && j.label == spec.label) {
                Some(job) => job.shared_by.push(handle.name.clone()),
                None => jobs.push(InventoryJob {
                    argv,
                    manager: handle.name.clone(),
                    label: spec.label.to_string(),
                    shared_by: vec![handle.name.clone()],
                }),
            }
        }

        jobs
    }

    /// 并发执行所有列表命令，按探测顺序合并并去重
    pub async fn list_installed(&self, cancel: &CancellationToken, timeout: Option<Duration>) -> InventoryLoad {
        let jobs = self.inventory_jobs();
        let outputs = join_all(jobs.iter().map(|job| invoke::capture(&job.argv, cancel, timeout))).await;

        let mut load = InventoryLoad::default();
        for (job, output) in jobs.iter().zip(outputs) {
            match output {
                Ok(raw) => {
                    let records = self
                        .parsers
                        .parse(&job.manager, &job.label, ParseMode::ListInstalled, &raw);
                    log::debug!(
                        "{}: {} installed packages (shared by {})",
                        job.manager,
                        records.len(),
                        job.shared_by.join(", ")
                    );
                    load.records.extend(records);
                }
                Err(e) => {
                    log::debug!("{} list failed: {e}", job.manager);
                    load.failures.push((job.manager.clone(), e));
                }
            }
        }

        load.records = dedup_records(load.records);
        load
    }

    /// 在单个管理器上搜索，搜索词统一转成小写
    pub async fn search_one(
        &self,
        manager: &str,
        query: &str,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Vec<PackageRecord>, InvocationError> {
        let spec = self.registry.get(manager).ok_or_else(|| {
            InvocationError::Template(error::TemplateError::Unsupported {
                manager: manager.to_string(),
                command: CommandKind::Search.label(),
            })
        })?;
        let query = query.to_lowercase();
        let argv = spec.command(CommandKind::Search, Some(&query))?;
        log::debug!("search via {manager}: `{}`", argv.join(" "));

        let raw = invoke::capture(&argv, cancel, timeout).await?;
        Ok(self.parsers.parse(manager, spec.label, ParseMode::Search, &raw))
    }

    /// 选出执行某类命令的管理器
    ///
    /// 指定名字时必须已被探测到且支持该命令；否则取第一个支持的。
    pub fn resolve(&self, manager: Option<&str>, kind: CommandKind) -> Result<&ManagerSpec> {
        match manager {
            Some(name) => {
                if self.discovery.get(name).is_none() {
                    bail!("package manager `{name}` was not detected on this system");
                }
                let spec = self
                    .registry
                    .get(name)
                    .ok_or_else(|| anyhow!("unknown package manager `{name}`"))?;
                if !spec.supports(kind) {
                    bail!("{name} does not support `{}`", kind.label());
                }
                Ok(spec)
            }
            None => self
                .discovery
                .handles
                .iter()
                .filter_map(|h| self.registry.get(&h.name))
                .find(|spec| spec.supports(kind))
                .ok_or_else(|| anyhow!("no detected package manager supports `{}`", kind.label())),
        }
    }

    /// 以继承终端的方式执行安装/卸载/升级等命令
    pub fn run_command(&self, manager: Option<&str>, kind: CommandKind, package: Option<&str>) -> Result<bool> {
        if let Some(pkg) = package {
            validate_package_name(pkg)?;
        }
        let spec = self.resolve(manager, kind)?;
        let argv = spec.command(kind, package)?;
        invoke::run_interactive(&argv)
    }

    /// 依次刷新索引并全量升级每个已探测的管理器
    ///
    /// 相同的命令行只执行一次。返回是否全部成功。
    pub fn upgrade_all(&self) -> Result<bool> {
        let mut executed: Vec<Vec<String>> = Vec::new();
        let mut all_ok = true;

        for handle in &self.discovery.handles {
            let Some(spec) = self.registry.get(&handle.name) else {
                continue;
            };
            if !spec.supports(CommandKind::UpgradeAll) {
                continue;
            }
            for kind in [CommandKind::UpdateIndex, CommandKind::UpgradeAll] {
                if !spec.supports(kind) {
                    continue;
                }
                let argv = spec.command(kind, None)?;
                if executed.contains(&argv) {
                    continue;
                }
                let ok = invoke::run_interactive(&argv)?;
                if !ok {
                    log::warn!("`{}` failed", argv.join(" "));
                    all_ok = false;
                }
                executed.push(argv);
            }
        }

        Ok(all_ok)
    }
}

/// 包名只允许字母数字和 `_-@.+`
pub fn validate_package_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '@' | '.' | '+'));
    if !valid {
        bail!("invalid package name `{name}`");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{DelimitedParser, SlashParser};
    use registry::CommandTemplates;

    fn fake_spec(name: &'static str, label: &'static str, commands: CommandTemplates) -> ManagerSpec {
        ManagerSpec {
            name,
            executable: name,
            label,
            commands,
        }
    }

    fn discovery(names: &[&str]) -> Discovery {
        Discovery {
            handles: names
                .iter()
                .map(|n| ManagerHandle::new(*n, format!("/usr/bin/{n}")))
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    fn fake_manager() -> PackageManager {
        let list = "printf 'bash,5.2\\nvim,9.1\\n'";
        let registry = ManagerRegistry::new(vec![
            fake_spec(
                "alpha",
                "alpha",
                CommandTemplates {
                    list_installed: Some(list),
                    search: Some(r#"sh -c 'printf "%s/noble 9.1 amd64\n" "$0"' {}"#),
                    install: Some("true {}"),
                    ..Default::default()
                },
            ),
            fake_spec(
                "alpha-query",
                "alpha",
                CommandTemplates {
                    list_installed: Some(list),
                    ..Default::default()
                },
            ),
            fake_spec(
                "beta",
                "beta",
                CommandTemplates {
                    list_installed: Some("false"),
                    search: Some("false {}"),
                    ..Default::default()
                },
            ),
            fake_spec(
                "gamma",
                "gamma",
                CommandTemplates {
                    list_installed: Some("printf 'vim,8.0\\n'"),
                    ..Default::default()
                },
            ),
        ]);

        let mut parsers = ParserRegistry::new();
        for name in ["alpha", "alpha-query", "beta", "gamma"] {
            parsers.register(name, ParseMode::ListInstalled, DelimitedParser::new(','));
        }
        parsers.register("alpha", ParseMode::Search, SlashParser::apt());
        parsers.register("beta", ParseMode::Search, SlashParser::apt());

        PackageManager::from_parts(registry, parsers, discovery(&["alpha", "alpha-query", "beta", "gamma"]))
    }

    #[test]
    fn test_identical_list_commands_are_merged() {
        let pm = fake_manager();
        let jobs = pm.inventory_jobs();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].manager, "alpha");
        assert_eq!(jobs[0].shared_by, vec!["alpha", "alpha-query"]);
    }

    #[test]
    fn test_searchable_keeps_detection_order() {
        let pm = fake_manager();
        assert_eq!(pm.searchable(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_builtin_apt_family_shares_one_job() {
        let pm = PackageManager::from_parts(
            ManagerRegistry::builtin(),
            ParserRegistry::builtin(),
            discovery(&["apt", "dpkg", "dpkg-query", "snap"]),
        );
        let jobs = pm.inventory_jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].label, "apt");
        assert_eq!(jobs[0].argv[0], "dpkg-query");
        assert_eq!(pm.searchable(), vec!["apt", "snap"]);
        assert_eq!(pm.manager_for_label("apt", CommandKind::Install), Some("apt"));
        assert_eq!(pm.manager_for_label("macports", CommandKind::Install), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_installed_merges_and_tolerates_failure() {
        let pm = fake_manager();
        let cancel = CancellationToken::new();
        let load = pm.list_installed(&cancel, None).await;

        assert_eq!(
            load.records,
            vec![
                PackageRecord::new("bash", "alpha", "5.2", true),
                PackageRecord::new("vim", "alpha", "9.1", true),
                PackageRecord::new("vim", "gamma", "8.0", true),
            ]
        );
        assert_eq!(load.failures.len(), 1);
        assert_eq!(load.failures[0].0, "beta");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_one_substitutes_query() {
        let pm = fake_manager();
        let cancel = CancellationToken::new();
        let records = pm.search_one("alpha", "vim", &cancel, None).await.unwrap();
        assert_eq!(records, vec![PackageRecord::new("vim", "alpha", "9.1", false)]);

        // 大小写不同的输入得到同样的结果
        let records = pm.search_one("alpha", "ViM", &cancel, None).await.unwrap();
        assert_eq!(records, vec![PackageRecord::new("vim", "alpha", "9.1", false)]);

        let err = pm.search_one("beta", "vim", &cancel, None).await.unwrap_err();
        assert!(matches!(err, InvocationError::Exit { .. }));

        let err = pm.search_one("gamma", "vim", &cancel, None).await.unwrap_err();
        assert!(matches!(err, InvocationError::Template(_)));
    }

    #[test]
    fn test_resolve_manager() {
        let pm = fake_manager();
        assert_eq!(pm.resolve(None, CommandKind::Install).unwrap().name, "alpha");
        assert!(pm.resolve(Some("beta"), CommandKind::Install).is_err());
        assert!(pm.resolve(Some("pacman"), CommandKind::Install).is_err());
        assert!(pm.resolve(None, CommandKind::UpgradeAll).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_validates_name() {
        let pm = fake_manager();
        assert!(pm.run_command(None, CommandKind::Install, Some("vim")).unwrap());
        assert!(pm.run_command(None, CommandKind::Install, Some("vim; rm -rf /")).is_err());
    }

    #[test]
    fn test_validate_package_name() {
        for ok in ["vim", "python3.12", "g++", "node@20", "lib_foo-bar"] {
            assert!(validate_package_name(ok).is_ok(), "{ok}");
        }
        for bad in ["", "a b", "x;y", "$(id)", "../etc"] {
            assert!(validate_package_name(bad).is_err(), "{bad}");
        }
    }
}
