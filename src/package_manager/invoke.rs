//! 子进程执行
//!
//! `capture` 用于列表与搜索：只捕获 stdout，可被取消令牌中止。
//! `run_interactive` 用于安装/卸载/升级：继承终端的标准输入输出。

use super::error::InvocationError;
use anyhow::Result;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// 运行命令并返回 stdout 文本
///
/// 取消或超时时向子进程所在进程组发送 SIGTERM，之后不再等待它退出；
/// 子进程句柄被丢弃时 `kill_on_drop` 兜底。被取消的调用不会返回任何输出。
pub async fn capture(
    argv: &[String],
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<String, InvocationError> {
    let (program, args) = argv.split_first().ok_or(InvocationError::EmptyCommand)?;

    if cancel.is_cancelled() {
        return Err(InvocationError::Cancelled);
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("TERM", "dumb")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    // 独立进程组，取消时可以连同孙进程一起终止
    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }

    let mut child = cmd.spawn().map_err(|source| InvocationError::Spawn {
        program: program.clone(),
        source,
    })?;
    let pid = child.id();

    let mut stdout = child.stdout.take().ok_or_else(|| InvocationError::Io {
        program: program.clone(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "stdout was not captured"),
    })?;

    let run = async {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await?;
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, buf))
    };

    let deadline = async {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            terminate(pid);
            log::debug!("`{program}` cancelled");
            return Err(InvocationError::Cancelled);
        }
        _ = deadline => {
            terminate(pid);
            return Err(InvocationError::TimedOut {
                program: program.clone(),
                timeout: timeout.unwrap_or_default(),
            });
        }
        res = run => res,
    };

    // 输出读完的同时被取消，结果同样作废
    if cancel.is_cancelled() {
        return Err(InvocationError::Cancelled);
    }

    let (status, buf) = outcome.map_err(|source| InvocationError::Io {
        program: program.clone(),
        source,
    })?;

    if !status.success() {
        return Err(InvocationError::Exit {
            program: program.clone(),
            status: status.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(unix)]
fn terminate(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn terminate(_pid: Option<u32>) {}

/// 直接执行命令，继承标准输入输出，返回是否成功退出
pub fn run_interactive(argv: &[String]) -> Result<bool> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("empty command line"))?;
    log::info!("running `{}`", argv.join(" "));
    let output = duct::cmd(program, args).unchecked().run()?;
    Ok(output.status.success())
}
