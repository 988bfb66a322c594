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

use std::sync::Arc;

use crate::core::model::{error::GatewayError, naming::ServiceInstance};
use crate::core::plugin::{
    discovery::{InstanceRegistry, StaticInstanceSupplier},
    loadbalance::LoadBalancer,
};

/// InstanceSelector 为负载均衡路由选择上游实例
///
/// The dynamic registry is preferred whenever it holds instances for the
/// service; the static list is only consulted on a registry miss.
pub struct InstanceSelector {
    registry: Arc<dyn InstanceRegistry>,
    static_instances: Arc<dyn StaticInstanceSupplier>,
    balancer: Arc<dyn LoadBalancer>,
}

impl InstanceSelector {
    pub fn new(
        registry: Arc<dyn InstanceRegistry>,
        static_instances: Arc<dyn StaticInstanceSupplier>,
        balancer: Arc<dyn LoadBalancer>,
    ) -> Self {
        Self {
            registry,
            static_instances,
            balancer,
        }
    }

    pub fn balancer_name(&self) -> String {
        self.balancer.name()
    }

    pub fn select(&self, service_name: &str) -> Result<ServiceInstance, GatewayError> {
        let dynamic = self.registry.snapshot(service_name);
        if !dynamic.is_empty() {
            return self.balancer.choose_instance(service_name, &dynamic);
        }

        let configured = self.static_instances.configured_instances(service_name);
        if !configured.is_empty() {
            tracing::debug!(
                "[polaris][gateway] service {} has no discovered instances, fallback to {} static instances",
                service_name,
                configured.len()
            );
            return self.balancer.choose_instance(service_name, &configured);
        }

        Err(GatewayError::no_instances(service_name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::core::model::error::ErrorCode;
    use crate::plugins::discovery::memory::MemoryInstanceRegistry;
    use crate::plugins::discovery::static_config::StaticInstanceConfig;
    use crate::plugins::loadbalance::roundrobin::RoundRobinBalancer;

    fn instances(service: &str, ids: &[&str]) -> Vec<ServiceInstance> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| ServiceInstance::new(service, id, &format!("10.0.0.{}", i + 1), 8080, false))
            .collect()
    }

    fn selector(
        dynamic: HashMap<String, Vec<ServiceInstance>>,
        configured: HashMap<String, Vec<ServiceInstance>>,
    ) -> (InstanceSelector, Arc<MemoryInstanceRegistry>) {
        let registry = Arc::new(MemoryInstanceRegistry::new());
        registry.replace_all(dynamic);
        let selector = InstanceSelector::new(
            registry.clone(),
            Arc::new(StaticInstanceConfig::new(configured)),
            Arc::new(RoundRobinBalancer::new()),
        );
        (selector, registry)
    }

    fn ids(selector: &InstanceSelector, service: &str, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| selector.select(service).unwrap().instance_id)
            .collect()
    }

    #[test]
    fn test_round_robin_over_static_instances() {
        let (selector, _) = selector(
            HashMap::new(),
            HashMap::from([("svc".to_string(), instances("svc", &["I1", "I2", "I3"]))]),
        );
        assert_eq!(ids(&selector, "svc", 4), vec!["I1", "I2", "I3", "I1"]);
    }

    #[test]
    fn test_fallback_and_no_instances() {
        let (selector, _) = selector(
            HashMap::from([("X".to_string(), Vec::new())]),
            HashMap::from([("X".to_string(), instances("X", &["I1"]))]),
        );
        assert_eq!(selector.select("X").unwrap().instance_id, "I1");

        let err = selector.select("Y").err().unwrap();
        assert_eq!(err.code(), ErrorCode::NoInstancesAvailable);
        assert_eq!(err.service(), Some("Y"));
    }

    #[test]
    fn test_dynamic_instances_preferred() {
        let (selector, registry) = selector(
            HashMap::new(),
            HashMap::from([("svc".to_string(), instances("svc", &["static-1"]))]),
        );
        assert_eq!(selector.select("svc").unwrap().instance_id, "static-1");

        registry.update_service("svc", instances("svc", &["dyn-1", "dyn-2"]));
        for _ in 0..4 {
            assert!(selector.select("svc").unwrap().instance_id.starts_with("dyn-"));
        }

        registry.remove_service("svc");
        assert_eq!(selector.select("svc").unwrap().instance_id, "static-1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_selection_is_fair() {
        let (selector, _) = selector(
            HashMap::from([("svc".to_string(), instances("svc", &["I1", "I2", "I3"]))]),
            HashMap::new(),
        );
        let selector = Arc::new(selector);
        let tasks = 12;
        let per_task = 300;

        let mut handles = Vec::with_capacity(tasks);
        for _ in 0..tasks {
            let selector = selector.clone();
            handles.push(tokio::spawn(async move {
                let mut picked = Vec::with_capacity(per_task);
                for _ in 0..per_task {
                    picked.push(selector.select("svc").unwrap().instance_id);
                    tokio::task::yield_now().await;
                }
                picked
            }));
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                *counts.entry(id).or_default() += 1;
            }
        }
        // 计数器没有丢失更新时，每个实例恰好被选中 N / len 次
        let total = tasks * per_task;
        assert_eq!(counts.values().sum::<usize>(), total);
        for id in ["I1", "I2", "I3"] {
            assert_eq!(counts[id], total / 3);
        }
    }
}
