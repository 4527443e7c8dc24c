//! 增量搜索：防抖、按代取消、并发扇出与合并

mod coordinator;
mod runner;

pub use coordinator::SearchCoordinator;
pub use runner::{search_once, spawn_search};

use crate::package_manager::{InvocationError, PackageRecord};
use crate::package_manager::types::SearchGeneration;
use tokio_util::sync::CancellationToken;

/// 协调器决定发起一代搜索时交给执行层的请求
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub generation: SearchGeneration,
    pub query: String,
    /// 按探测顺序排列，下标即结果槽位
    pub managers: Vec<String>,
    pub cancel: CancellationToken,
}

/// 单个管理器在某一代搜索中的结果
#[derive(Debug)]
pub struct SearchEvent {
    pub generation: SearchGeneration,
    pub slot: usize,
    pub manager: String,
    pub outcome: Result<Vec<PackageRecord>, InvocationError>,
}
