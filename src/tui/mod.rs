mod input;
mod inventory;
mod layout;
mod state;
mod theme;
mod view;

use crate::config::Config;
use crate::package_manager::PackageManager;
use crate::search::spawn_search;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, AppEvent, PendingCommand};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(pm: PackageManager, config: Config) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(pm, config);
    let (tx, mut rx) = mpsc::channel(64);
    let shutdown = CancellationToken::new();

    load_inventory(&mut app, &tx, &shutdown);

    let result = event_loop(&mut terminal, &mut app, &tx, &mut rx, &shutdown).await;

    // 终止所有仍在运行的子进程
    app.search.cancel();
    shutdown.cancel();

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    rx: &mut mpsc::Receiver<AppEvent>,
    shutdown: &CancellationToken,
) -> Result<()> {
    loop {
        // 防抖到期则发起新一代搜索
        if let Some(request) = app.search.poll(Instant::now()) {
            spawn_search(&app.pm, &request, app.config.search_timeout(), tx);
        }

        let term_size = terminal.size()?;
        app.model
            .set_viewport_height(layout::visible_list_height(term_size.height));

        terminal.draw(|f| view::render(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = app.handle_key(key, Instant::now()) {
                        run_pending(terminal, app, &command)?;
                        load_inventory(app, tx, shutdown);
                    }
                }
            }
        }

        // 处理异步事件
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::InventoryLoaded(seq, load) => app.inventory_loaded(seq, load),
                AppEvent::Search(event) => app.search_event(event),
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// 每次加载都会取消上一次仍在运行的加载
fn load_inventory(app: &mut App, tx: &mpsc::Sender<AppEvent>, shutdown: &CancellationToken) {
    let (seq, cancel) = app.begin_inventory_load(shutdown);
    let pm = app.pm.clone();
    let tx = tx.clone();
    let timeout = app.config.search_timeout();

    tokio::spawn(async move {
        let load = pm.list_installed(&cancel, timeout).await;
        if cancel.is_cancelled() {
            return;
        }
        let _ = tx.send(AppEvent::InventoryLoaded(seq, load)).await;
    });
}

/// 临时退出 TUI 执行安装/卸载/升级，结束后恢复 TUI
fn run_pending(terminal: &mut Term, app: &mut App, command: &PendingCommand) -> Result<()> {
    app.search.cancel();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    println!(
        "==> {} {} via {}",
        command.kind.label(),
        command.package,
        command.manager
    );
    println!();

    let outcome = app
        .pm
        .run_command(Some(&command.manager), command.kind, Some(&command.package));

    let notice = match &outcome {
        Ok(true) => format!("{} {}: done", command.kind.label(), command.package),
        Ok(false) => format!("{} {}: failed", command.kind.label(), command.package),
        Err(e) => format!("{} {}: {e}", command.kind.label(), command.package),
    };
    println!();
    println!("{notice}");
    log::info!("{notice}");

    std::thread::sleep(Duration::from_millis(800));

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    terminal.clear()?;

    // 查询被取消，重新按当前输入发起
    app.query_changed(Instant::now());
    app.notice = Some(notice);
    Ok(())
}
