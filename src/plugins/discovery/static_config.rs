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
use std::sync::Arc;

use crate::core::model::naming::ServiceInstance;
use crate::core::plugin::discovery::StaticInstanceSupplier;

use super::memory::normalize;

/// StaticInstanceConfig 配置文件中声明的静态实例，启动后只读
#[derive(Default)]
pub struct StaticInstanceConfig {
    services: HashMap<String, Arc<Vec<ServiceInstance>>>,
}

impl StaticInstanceConfig {
    pub fn new(services: HashMap<String, Vec<ServiceInstance>>) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|(name, instances)| {
                    let instances = normalize(&name, instances);
                    (name, Arc::new(instances))
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl StaticInstanceSupplier for StaticInstanceConfig {
    fn configured_instances(&self, service_name: &str) -> Arc<Vec<ServiceInstance>> {
        self.services.get(service_name).cloned().unwrap_or_default()
    }
}
