use super::{SearchCoordinator, SearchEvent, SearchRequest};
use crate::package_manager::{PackageManager, PackageRecord};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// 为请求中的每个管理器启动一个搜索任务
///
/// 被取消的调用不发送任何事件。
pub fn spawn_search<E>(pm: &PackageManager, request: &SearchRequest, timeout: Option<Duration>, tx: &mpsc::Sender<E>)
where
    E: From<SearchEvent> + Send + 'static,
{
    for (slot, manager) in request.managers.iter().enumerate() {
        let pm = pm.clone();
        let tx = tx.clone();
        let manager = manager.clone();
        let query = request.query.clone();
        let cancel = request.cancel.clone();
        let generation = request.generation;

        tokio::spawn(async move {
            let outcome = pm.search_one(&manager, &query, &cancel, timeout).await;
            if matches!(&outcome, Err(e) if e.is_cancelled()) {
                return;
            }
            let event = SearchEvent {
                generation,
                slot,
                manager,
                outcome,
            };
            let _ = tx.send(E::from(event)).await;
        });
    }
}

/// 单次搜索（命令行 `search` 子命令），返回结果与状态文本
pub async fn search_once(pm: &PackageManager, query: &str, timeout: Option<Duration>) -> (Vec<PackageRecord>, String) {
    let mut coordinator = SearchCoordinator::new(pm.searchable(), Duration::ZERO);
    let now = Instant::now();
    coordinator.query_changed(query, now);

    if let Some(request) = coordinator.poll(now) {
        let (tx, mut rx) = mpsc::channel::<SearchEvent>(request.managers.len().max(1));
        spawn_search(pm, &request, timeout, &tx);
        drop(tx);

        while let Some(event) = rx.recv().await {
            if coordinator.accept(event) {
                break;
            }
        }
    }

    (coordinator.results().to_vec(), coordinator.status().to_string())
}
