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

use rand::Rng;

use crate::core::{
    model::{error::GatewayError, naming::ServiceInstance},
    plugin::{
        loadbalance::{LoadBalancer, DEFAULT_LB_RANDOM},
        plugins::Plugin,
    },
};

pub struct RandomBalancer {}

impl RandomBalancer {
    pub fn builder() -> (fn() -> Box<dyn LoadBalancer>, String) {
        (new_instance, DEFAULT_LB_RANDOM.to_string())
    }
}

fn new_instance() -> Box<dyn LoadBalancer> {
    Box::new(RandomBalancer {})
}

impl Plugin for RandomBalancer {
    fn name(&self) -> String {
        DEFAULT_LB_RANDOM.to_string()
    }

    fn init(&mut self) {}

    fn destroy(&self) {}
}

impl LoadBalancer for RandomBalancer {
    fn choose_instance(
        &self,
        service_name: &str,
        instances: &[ServiceInstance],
    ) -> Result<ServiceInstance, GatewayError> {
        if instances.is_empty() {
            return Err(GatewayError::no_instances(service_name));
        }
        let index = rand::thread_rng().gen_range(0..instances.len());
        tracing::trace!(
            "[polaris][loadbalancer][random] service {} choose instance index {}",
            service_name,
            index
        );
        Ok(instances[index].clone())
    }
}
