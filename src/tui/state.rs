use super::input::InputBox;
use super::inventory::InventoryModel;
use crate::config::Config;
use crate::package_manager::{CommandKind, InventoryLoad, PackageManager, PackageRecord};
use crate::search::{SearchCoordinator, SearchEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// 后台任务发回主循环的事件
#[derive(Debug)]
pub enum AppEvent {
    /// 携带发起时的加载序号
    InventoryLoaded(u64, InventoryLoad),
    Search(SearchEvent),
}

impl From<SearchEvent> for AppEvent {
    fn from(event: SearchEvent) -> Self {
        AppEvent::Search(event)
    }
}

/// 需要暂时交出终端才能执行的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub manager: String,
    pub package: String,
}

pub struct App {
    pub pm: PackageManager,
    pub config: Config,
    /// 静态清单（已安装）
    pub inventory: Vec<PackageRecord>,
    pub search: SearchCoordinator,
    pub model: InventoryModel,
    pub input: InputBox,
    pub loading: bool,
    /// 最近一次发起的清单加载序号，以及它的取消令牌
    inventory_seq: u64,
    inventory_cancel: Option<CancellationToken>,
    /// 临时提示，下次输入时清除
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(pm: PackageManager, config: Config) -> Self {
        let search = SearchCoordinator::new(pm.searchable(), config.debounce());
        Self {
            pm,
            config,
            inventory: Vec::new(),
            search,
            model: InventoryModel::new(),
            input: InputBox::new(),
            loading: false,
            inventory_seq: 0,
            inventory_cancel: None,
            notice: None,
            should_quit: false,
        }
    }

    pub fn status_line(&self) -> String {
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        if self.loading {
            return "Loading installed packages...".to_string();
        }
        self.search.status().to_string()
    }

    /// 静态清单在前，追加清单中尚不存在的搜索结果
    pub fn rebuild_source(&mut self) {
        let present: HashSet<(&str, &str)> = self.inventory.iter().map(PackageRecord::key).collect();
        let mut source = self.inventory.clone();
        source.extend(
            self.search
                .results()
                .iter()
                .filter(|r| !present.contains(&r.key()))
                .cloned(),
        );
        self.model.set_source(source);
    }

    /// 发起新的清单加载：取消仍在进行的上一次，返回新序号和令牌
    pub fn begin_inventory_load(&mut self, parent: &CancellationToken) -> (u64, CancellationToken) {
        if let Some(previous) = self.inventory_cancel.take() {
            previous.cancel();
        }
        self.inventory_seq += 1;
        let cancel = parent.child_token();
        self.inventory_cancel = Some(cancel.clone());
        self.loading = true;
        (self.inventory_seq, cancel)
    }

    /// 只采用最近一次发起的加载结果
    pub fn inventory_loaded(&mut self, seq: u64, load: InventoryLoad) {
        if seq != self.inventory_seq {
            log::debug!("dropping stale inventory load {seq} (current {})", self.inventory_seq);
            return;
        }
        self.inventory_cancel = None;
        self.loading = false;
        if !load.failures.is_empty() {
            let names: Vec<&str> = load.failures.iter().map(|(m, _)| m.as_str()).collect();
            self.notice = Some(format!("Could not list packages from {}", names.join(", ")));
        }
        self.inventory = load.records;
        self.rebuild_source();
    }

    pub fn search_event(&mut self, event: SearchEvent) {
        if self.search.accept(event) {
            self.rebuild_source();
        }
    }

    pub fn query_changed(&mut self, now: Instant) {
        self.notice = None;
        let query = self.input.content().to_string();
        self.search.query_changed(&query, now);
        self.model.set_filter(&query);
        // 空查询立即完成，视图退回静态清单
        if query.trim().is_empty() {
            self.rebuild_source();
        }
    }

    /// 处理按键；需要执行外部命令时返回该命令
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<PendingCommand> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('x') if ctrl => return self.command_for_selected(CommandKind::Uninstall),
            KeyCode::Char('u') if ctrl => return self.command_for_selected(CommandKind::Upgrade),
            KeyCode::Char('a') if ctrl => self.input.move_home(),
            KeyCode::Char('e') if ctrl => self.input.move_end(),
            KeyCode::Char('w') if ctrl => {
                if self.input.delete_word() {
                    self.query_changed(now);
                }
            }
            KeyCode::Enter => return self.command_for_selected(CommandKind::Install),
            KeyCode::Up => self.model.move_up(),
            KeyCode::Down => self.model.move_down(),
            KeyCode::PageUp => self.model.page_up(),
            KeyCode::PageDown => self.model.page_down(),
            KeyCode::Home => self.model.home(),
            KeyCode::End => self.model.end(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Backspace => {
                if self.input.delete_back() {
                    self.query_changed(now);
                }
            }
            KeyCode::Delete => {
                if self.input.delete_forward() {
                    self.query_changed(now);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.insert(c);
                self.query_changed(now);
            }
            _ => {}
        }
        None
    }

    fn command_for_selected(&mut self, kind: CommandKind) -> Option<PendingCommand> {
        let record = self.model.selected()?.clone();

        let allowed = match kind {
            CommandKind::Install => !record.installed,
            _ => record.installed,
        };
        if !allowed {
            self.notice = Some(match kind {
                CommandKind::Install => format!("{} is already installed", record.name),
                _ => format!("{} is not installed", record.name),
            });
            return None;
        }

        match self.pm.manager_for_label(&record.manager, kind) {
            Some(manager) => Some(PendingCommand {
                kind,
                manager: manager.to_string(),
                package: record.name,
            }),
            None => {
                self.notice = Some(format!("{} cannot {} packages", record.manager, kind.label()));
                None
            }
        }
    }
}
