//! 包管理器相关数据类型定义

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// 版本无法识别时使用的占位值
pub const UNKNOWN_VERSION: &str = "unknown";

/// 统一的软件包记录，所有解析器最终都输出这个形状
///
/// 同名包可能出现在多个管理器下，唯一性由 `(name, manager)` 决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub manager: String,
    /// 原样展示的版本字符串，不做任何语义比较
    pub version: String,
    pub installed: bool,
    /// 仅段落格式（包行下方缩进的描述行）会填充
    pub description: String,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        manager: impl Into<String>,
        version: impl Into<String>,
        installed: bool,
    ) -> Self {
        Self {
            name: name.into(),
            manager: manager.into(),
            version: version.into(),
            installed,
            description: String::new(),
        }
    }

    /// 去重键
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.manager)
    }
}

/// 按 `(name, manager)` 去重，保留首次出现的记录与原有顺序
pub fn dedup_records(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.name.clone(), r.manager.clone())))
        .collect()
}

/// 已探测到、可调用的包管理器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerHandle {
    pub name: String,
    pub executable_path: PathBuf,
}

impl ManagerHandle {
    pub fn new(name: impl Into<String>, executable_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
        }
    }
}

/// 子进程输出是 "列出已安装" 还是 "搜索" 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    ListInstalled,
    Search,
}

impl ParseMode {
    /// 没有显式安装标记时的默认安装状态
    pub fn default_installed(self) -> bool {
        matches!(self, ParseMode::ListInstalled)
    }
}

/// 一次搜索尝试的单调递增标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchGeneration(u64);

impl SearchGeneration {
    pub const ZERO: SearchGeneration = SearchGeneration(0);

    pub fn next(self) -> Self {
        SearchGeneration(self.0 + 1)
    }
}

impl fmt::Display for SearchGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
