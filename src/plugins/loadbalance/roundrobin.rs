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

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;

use crate::core::{
    model::{error::GatewayError, naming::ServiceInstance},
    plugin::{
        loadbalance::{LoadBalancer, DEFAULT_LB_ROUND_ROBIN},
        plugins::Plugin,
    },
};

/// RoundRobinBalancer 按服务名维护独立的轮询计数器
///
/// Each service owns one atomic counter; selections for different services
/// never contend on a shared lock.
pub struct RoundRobinBalancer {
    counters: DashMap<String, Arc<AtomicUsize>>,
}

impl RoundRobinBalancer {
    pub fn builder() -> (fn() -> Box<dyn LoadBalancer>, String) {
        (new_instance, DEFAULT_LB_ROUND_ROBIN.to_string())
    }

    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    fn counter(&self, service_name: &str) -> Arc<AtomicUsize> {
        if let Some(counter) = self.counters.get(service_name) {
            return counter.clone();
        }
        self.counters
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
            .clone()
    }
}

impl Default for RoundRobinBalancer {
    fn default() -> Self {
        Self::new()
    }
}

fn new_instance() -> Box<dyn LoadBalancer> {
    Box::new(RoundRobinBalancer::new())
}

impl Plugin for RoundRobinBalancer {
    fn name(&self) -> String {
        DEFAULT_LB_ROUND_ROBIN.to_string()
    }

    fn init(&mut self) {}

    fn destroy(&self) {
        self.counters.clear();
    }
}

impl LoadBalancer for RoundRobinBalancer {
    fn choose_instance(
        &self,
        service_name: &str,
        instances: &[ServiceInstance],
    ) -> Result<ServiceInstance, GatewayError> {
        if instances.is_empty() {
            return Err(GatewayError::no_instances(service_name));
        }
        // fetch_add 回绕后取模仍然均匀
        let index = self.counter(service_name).fetch_add(1, Ordering::Relaxed) % instances.len();
        Ok(instances[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::error::ErrorCode;

    fn instances(n: usize) -> Vec<ServiceInstance> {
        (1..=n)
            .map(|i| ServiceInstance::new("svc", &format!("I{}", i), "127.0.0.1", 8080 + i as u16, false))
            .collect()
    }

    #[test]
    fn test_rotates_per_service() {
        let balancer = RoundRobinBalancer::new();
        let svc = instances(3);
        let picked: Vec<String> = (0..4)
            .map(|_| balancer.choose_instance("svc", &svc).unwrap().instance_id)
            .collect();
        assert_eq!(picked, vec!["I1", "I2", "I3", "I1"]);

        // 其他服务的计数器互不影响
        let other = balancer.choose_instance("other", &svc).unwrap();
        assert_eq!(other.instance_id, "I1");
    }

    #[test]
    fn test_empty_instances() {
        let balancer = RoundRobinBalancer::new();
        let err = balancer.choose_instance("svc", &[]).err().unwrap();
        assert_eq!(err.code(), ErrorCode::NoInstancesAvailable);
        assert_eq!(err.service(), Some("svc"));
    }
}
