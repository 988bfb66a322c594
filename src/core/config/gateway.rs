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

use std::collections::HashMap;

use serde::Deserialize;

use crate::core::model::{
    naming::ServiceInstance,
    route::{FilterSpec, RouteDefinition},
};
use crate::core::plugin::loadbalance::DEFAULT_LB_ROUND_ROBIN;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GatewayConfig {
    /// 追加到每条路由之前的过滤器
    #[serde(default)]
    pub default_filters: Vec<FilterSpec>,
    /// 与主机名无关的路由，也是按主机选择时的兜底列表
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
    /// key 为精确主机名或 `*.suffix` 通配
    #[serde(default)]
    pub host_routes: HashMap<String, Vec<RouteDefinition>>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoadBalancerConfig {
    #[serde(default = "default_policy")]
    pub default_policy: String,
    /// 静态实例，服务发现没有实例时使用
    #[serde(default)]
    pub services: HashMap<String, Vec<ServiceInstance>>,
}

fn default_policy() -> String {
    DEFAULT_LB_ROUND_ROBIN.to_string()
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            default_policy: default_policy(),
            services: HashMap::new(),
        }
    }
}
