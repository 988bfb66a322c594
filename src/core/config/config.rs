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

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::core::config::gateway::{GatewayConfig, LoadBalancerConfig};
use crate::core::config::global::GlobalConfig;
use crate::core::model::error::{ErrorCode, GatewayError};

/// Environment variable naming the configuration file read by [`load_default`].
pub static CONFIG_FILE_ENV: &str = "POLARIS_GATEWAY_CONFIG";

const DEFAULT_CONFIG: &str = r#"
global:
  logger:
    dir: ./logs
    file: polaris-gateway.log
    level: info
gateway:
  routes: []
loadbalancer:
  defaultPolicy: roundRobin
"#;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub loadbalancer: LoadBalancerConfig,
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration, GatewayError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|err| {
        GatewayError::new(
            ErrorCode::InvalidConfig,
            format!("failure to read config file {}: {}", path.display(), err),
        )
    })?;
    load_from_str(&data)
}

pub fn load_from_str(data: &str) -> Result<Configuration, GatewayError> {
    serde_yaml::from_str(data).map_err(|err| {
        GatewayError::new(
            ErrorCode::InvalidConfig,
            format!("failure to format yaml str: {}", err),
        )
    })
}

/// load_default 优先读取环境变量指定的文件，否则使用内置默认配置
pub fn load_default() -> Result<Configuration, GatewayError> {
    match env::var(CONFIG_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => load(path.trim()),
        _ => load_from_str(DEFAULT_CONFIG),
    }
}
