// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应终结模块
//!
//! 根据 `ResponseState` 选出唯一的终止动作，按以下优先级依次判断：
//! 1. 存在终止错误：记录日志，写出状态码（未设置时为 500）与错误体。
//! 2. 状态码为重定向：只写出状态行（`Location` 已由 `redirect` 设置）。
//! 3. 已旁路：不做任何写入。
//! 4. 默认：写出状态码（未设置时为 200）与输出内容。
//!
//! 对同一个请求重复调用不会产生第二次写入。传输层写入失败只记录日志，不会重试。

use log::{debug, error, warn};

use crate::{response::ResponseState, transport::Transport};

/// 实际执行的终止动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalAction {
    Error(u16),
    Redirect(u16),
    Bypassed,
    Normal(u16),
}

pub fn finalize<T: Transport + ?Sized>(
    state: &mut ResponseState,
    transport: &mut T,
    id: u128,
) -> TerminalAction {
    if let Some(action) = state.finalized() {
        warn!("[ID{}]响应已经结束（{:?}），忽略重复的写出", id, action);
        return action;
    }

    let action = if let Some(e) = state.error() {
        error!("[ID{}]{}", id, e);
        if state.status_code() == 0 {
            state.set_status_code(500);
        }
        TerminalAction::Error(state.status_code())
    } else if state.is_redirect() {
        TerminalAction::Redirect(state.status_code())
    } else if state.is_bypassed() {
        TerminalAction::Bypassed
    } else {
        if state.status_code() == 0 {
            state.set_status_code(200);
        }
        TerminalAction::Normal(state.status_code())
    };
    state.mark_finalized(action);

    match action {
        TerminalAction::Error(code) | TerminalAction::Normal(code) => {
            state.flush_headers(transport);
            if let Err(e) = transport.write_header(code) {
                warn!("[ID{}]写出状态行失败: {}", id, e);
                return action;
            }
            if let Err(e) = transport.write_body(state.output()) {
                warn!("[ID{}]写出响应体失败: {}", id, e);
            }
        }
        TerminalAction::Redirect(code) => {
            state.flush_headers(transport);
            if let Err(e) = transport.write_header(code) {
                warn!("[ID{}]写出重定向状态行失败: {}", id, e);
            }
        }
        TerminalAction::Bypassed => {
            debug!("[ID{}]响应已由协作方直接写出", id);
        }
    }
    action
}
