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

use polaris_gateway::core::logger::logger::{init_console_logger, init_logger};
use polaris_gateway::core::model::error::ErrorCode;
use tracing::level_filters::LevelFilter;

#[test]
fn test_logger_installs_once() {
    let dir = std::env::temp_dir().join(format!("polaris-gateway-log-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    let guard = init_logger(dir.to_str().unwrap(), "gateway.log", LevelFilter::INFO).unwrap();
    tracing::info!("[polaris][gateway] logger test line");
    drop(guard);

    let content = std::fs::read_to_string(dir.join("gateway.log")).unwrap();
    assert!(content.contains("logger test line"));

    let err = init_console_logger(LevelFilter::DEBUG).err().unwrap();
    assert_eq!(err.code(), ErrorCode::InvalidState);
    let err = init_logger(dir.to_str().unwrap(), "again.log", LevelFilter::INFO).err().unwrap();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    std::fs::remove_dir_all(&dir).unwrap();
}
