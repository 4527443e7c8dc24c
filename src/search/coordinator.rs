use super::{SearchEvent, SearchRequest};
use crate::package_manager::types::{dedup_records, PackageRecord, SearchGeneration};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_SEARCHING: &str = "Searching...";
const STATUS_NO_MANAGER: &str = "No detected package manager supports search";

#[derive(Debug, Clone)]
pub enum SearchState {
    Idle,
    Searching {
        generation: SearchGeneration,
        cancel: CancellationToken,
    },
    Completed(SearchGeneration),
    /// 被更新的查询取代
    Superseded(SearchGeneration),
    Cancelled(SearchGeneration),
}

/// 搜索状态机
///
/// 不启动任何任务，只根据显式输入（查询变化、时间推进、结果到达）迁移状态；
/// 子进程由调用方根据 `poll` 返回的请求启动。
#[derive(Debug)]
pub struct SearchCoordinator {
    managers: Vec<String>,
    debounce: Duration,
    generation: SearchGeneration,
    state: SearchState,
    /// 等待防抖到期的查询
    pending: Option<(String, Instant)>,
    slots: Vec<Option<Result<Vec<PackageRecord>, String>>>,
    results: Vec<PackageRecord>,
    status: String,
}

impl SearchCoordinator {
    pub fn new(managers: Vec<String>, debounce: Duration) -> Self {
        Self {
            managers,
            debounce,
            generation: SearchGeneration::ZERO,
            state: SearchState::Idle,
            pending: None,
            slots: Vec::new(),
            results: Vec::new(),
            status: STATUS_READY.to_string(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// 最近一次完成的搜索结果
    pub fn results(&self) -> &[PackageRecord] {
        &self.results
    }

    /// 正在等待防抖或子进程
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || matches!(self.state, SearchState::Searching { .. })
    }

    /// 查询变化：立即取消进行中的搜索，空查询直接完成
    pub fn query_changed(&mut self, query: &str, now: Instant) {
        self.supersede();

        if query.trim().is_empty() {
            self.pending = None;
            self.generation = self.generation.next();
            self.state = SearchState::Completed(self.generation);
            self.slots.clear();
            self.results.clear();
            self.status = STATUS_READY.to_string();
            return;
        }

        self.pending = Some((query.to_string(), now + self.debounce));
        self.status = STATUS_SEARCHING.to_string();
    }

    /// 防抖到期则开启新的一代，返回需要执行的请求
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => {}
            _ => return None,
        }
        let (query, _) = self.pending.take()?;

        self.generation = self.generation.next();
        let generation = self.generation;

        if self.managers.is_empty() {
            self.state = SearchState::Completed(generation);
            self.slots.clear();
            self.results.clear();
            self.status = STATUS_NO_MANAGER.to_string();
            return None;
        }

        let cancel = CancellationToken::new();
        self.state = SearchState::Searching {
            generation,
            cancel: cancel.clone(),
        };
        self.slots = vec![None; self.managers.len()];
        log::debug!("search {generation} for `{query}` on {:?}", self.managers);

        Some(SearchRequest {
            generation,
            query,
            managers: self.managers.clone(),
            cancel,
        })
    }

    /// 接收一个管理器的结果；返回可见结果是否发生变化
    ///
    /// 过期代的结果无条件丢弃。所有槽位到齐之前不暴露部分结果。
    pub fn accept(&mut self, event: SearchEvent) -> bool {
        let current = match &self.state {
            SearchState::Searching { generation, .. } => *generation,
            SearchState::Completed(last) | SearchState::Superseded(last) | SearchState::Cancelled(last) => {
                log::debug!("dropping {} result {} after search {last} ended", event.manager, event.generation);
                return false;
            }
            SearchState::Idle => return false,
        };
        if event.generation != current {
            log::debug!("dropping stale {} result {} (current {current})", event.manager, event.generation);
            return false;
        }

        let outcome = match event.outcome {
            Ok(records) => Ok(records),
            Err(e) if e.is_cancelled() => return false,
            Err(e) => {
                log::debug!("search on {} failed: {e}", event.manager);
                Err(e.to_string())
            }
        };

        match self.slots.get_mut(event.slot) {
            Some(slot) if slot.is_none() => *slot = Some(outcome),
            _ => return false,
        }

        if self.slots.iter().any(Option::is_none) {
            return false;
        }

        self.finish(current);
        true
    }

    /// 放弃当前搜索（例如退出时）
    pub fn cancel(&mut self) {
        self.pending = None;
        if let SearchState::Searching { generation, cancel } = &self.state {
            cancel.cancel();
            self.state = SearchState::Cancelled(*generation);
        }
    }

    fn supersede(&mut self) {
        if let SearchState::Searching { generation, cancel } = &self.state {
            cancel.cancel();
            log::debug!("search {generation} superseded");
            self.state = SearchState::Superseded(*generation);
            self.slots.clear();
        }
    }

    /// 按槽位（探测顺序）合并
    fn finish(&mut self, generation: SearchGeneration) {
        let total = self.slots.len();
        let mut merged = Vec::new();
        let mut errors = Vec::new();

        for slot in self.slots.drain(..).flatten() {
            match slot {
                Ok(records) => merged.extend(records),
                Err(e) => errors.push(e),
            }
        }

        self.results = dedup_records(merged);
        self.state = SearchState::Completed(generation);

        self.status = if errors.len() == total {
            format!("Search failed: {}", errors.join("; "))
        } else if errors.is_empty() {
            format!("Found {} packages", self.results.len())
        } else {
            format!(
                "Found {} packages ({} manager(s) failed)",
                self.results.len(),
                errors.len()
            )
        };
    }
}
