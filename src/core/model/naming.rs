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

use serde::Deserialize;

/// ServiceInstance 某个逻辑服务下的一个具体实例
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceInstance {
    // 配置文件中服务名来自外层 key，可以省略
    #[serde(default)]
    pub service_name: String,
    pub instance_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
}

impl ServiceInstance {
    pub fn new(service_name: &str, instance_id: &str, host: &str, port: u16, secure: bool) -> Self {
        Self {
            service_name: service_name.to_string(),
            instance_id: instance_id.to_string(),
            host: host.to_string(),
            port,
            secure,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn format_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// uri 实例的访问地址，形如 `http://host:port`
    pub fn uri(&self) -> String {
        format!("{}://{}", self.scheme(), self.format_address())
    }
}
