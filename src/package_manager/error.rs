//! 子进程调用与命令模板相关错误

use std::time::Duration;
use thiserror::Error;

/// 单个包管理器调用失败的原因
///
/// 这些错误只在本地恢复：对应管理器本次贡献 0 条记录，不会让整体失败。
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("empty command line")]
    EmptyCommand,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: String },

    #[error("I/O error while reading `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// 不是真正的错误，只是结果需要被丢弃
    #[error("invocation cancelled")]
    Cancelled,
}

impl InvocationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, InvocationError::Cancelled)
    }
}

/// 命令模板展开失败
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{manager} has no `{command}` command")]
    Unsupported { manager: String, command: &'static str },

    #[error("`{command}` for {manager} needs a package name")]
    MissingArgument { manager: String, command: &'static str },

    #[error("malformed command template `{template}`: {source}")]
    Malformed {
        template: String,
        #[source]
        source: shell_words::ParseError,
    },
}
