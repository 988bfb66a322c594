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

use arc_swap::ArcSwap;

use crate::core::model::naming::ServiceInstance;
use crate::core::plugin::discovery::InstanceRegistry;

type InstanceTable = HashMap<String, Arc<Vec<ServiceInstance>>>;

/// MemoryInstanceRegistry 由服务发现子系统推送的实例快照
///
/// Readers always observe a complete table: every update builds a new map and
/// swaps it in, nothing is mutated in place.
pub struct MemoryInstanceRegistry {
    services: ArcSwap<InstanceTable>,
}

impl MemoryInstanceRegistry {
    pub fn new() -> Self {
        Self {
            services: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// replace_all 整体替换所有服务的实例
    pub fn replace_all(&self, services: HashMap<String, Vec<ServiceInstance>>) {
        let table: InstanceTable = services
            .into_iter()
            .map(|(name, instances)| {
                let instances = normalize(&name, instances);
                (name, Arc::new(instances))
            })
            .collect();
        tracing::info!(
            "[polaris][discovery] instance registry replaced, services: {}",
            table.len()
        );
        self.services.store(Arc::new(table));
    }

    pub fn update_service(&self, service_name: &str, instances: Vec<ServiceInstance>) {
        let instances = Arc::new(normalize(service_name, instances));
        self.services.rcu(|current| {
            let mut next = InstanceTable::clone(current);
            next.insert(service_name.to_string(), instances.clone());
            next
        });
        tracing::debug!(
            "[polaris][discovery] service {} updated, instances: {}",
            service_name,
            instances.len()
        );
    }

    pub fn remove_service(&self, service_name: &str) {
        self.services.rcu(|current| {
            let mut next = InstanceTable::clone(current);
            next.remove(service_name);
            next
        });
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.load().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MemoryInstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceRegistry for MemoryInstanceRegistry {
    fn snapshot(&self, service_name: &str) -> Arc<Vec<ServiceInstance>> {
        self.services
            .load()
            .get(service_name)
            .cloned()
            .unwrap_or_default()
    }
}

/// normalize 填充服务名，并去掉重复的 instance_id（保留第一个）
pub(crate) fn normalize(service_name: &str, instances: Vec<ServiceInstance>) -> Vec<ServiceInstance> {
    let mut seen = std::collections::HashSet::with_capacity(instances.len());
    instances
        .into_iter()
        .map(|mut instance| {
            if instance.service_name.is_empty() {
                instance.service_name = service_name.to_string();
            }
            instance
        })
        .filter(|instance| {
            let fresh = seen.insert(instance.instance_id.clone());
            if !fresh {
                tracing::warn!(
                    "[polaris][discovery] service {} duplicate instance {} ignored",
                    service_name,
                    instance.instance_id
                );
            }
            fresh
        })
        .collect()
}
