// Tencent is pleased to support the open source community by making Polaris available.
//
// Copyright (C) 2019 THL A29 Limited, a Tencent company. All rights reserved.
//
// Licensed under the BSD 3-Clause License (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://opensource.org/licenses/BSD-3-Clause
//
// Unless required by applicable law or agreed to in writing, software distributed
// under the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR
// CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_appender::{non_blocking::WorkerGuard, rolling};

use crate::core::config::global::LoggerConfig;
use crate::core::model::error::{ErrorCode, GatewayError};

/// init_logger 安装写入 `dir/file` 的全局日志，返回的 guard 被丢弃前日志会持续刷盘
pub fn init_logger(dir: &str, file: &str, l: LevelFilter) -> Result<WorkerGuard, GatewayError> {
    let file_appender = rolling::never(dir, file);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_file(true)
        .with_level(true)
        .with_writer(non_blocking_appender)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_max_level(l)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(already_initialized)?;
    Ok(guard)
}

/// init_console_logger 安装输出到标准输出的全局日志
pub fn init_console_logger(l: LevelFilter) -> Result<(), GatewayError> {
    let subscriber = tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_file(true)
        .with_level(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_max_level(l)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(already_initialized)
}

pub fn init_from_config(conf: &LoggerConfig) -> Result<WorkerGuard, GatewayError> {
    init_logger(&conf.dir, &conf.file, parse_level(&conf.level)?)
}

pub fn parse_level(level: &str) -> Result<LevelFilter, GatewayError> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        GatewayError::new(
            ErrorCode::InvalidConfig,
            format!("unknown logger level {}", level),
        )
    })
}

fn already_initialized(err: tracing::subscriber::SetGlobalDefaultError) -> GatewayError {
    GatewayError::new(
        ErrorCode::InvalidState,
        format!("logger already initialized: {}", err),
    )
}
