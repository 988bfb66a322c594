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
use std::fmt::Display;
use std::sync::Arc;
use std::fmt;

use crate::core::model::error::{ErrorCode, GatewayError};
use crate::core::plugin::filter::FilterRegistry;
use crate::core::plugin::loadbalance::LoadBalancer;
use crate::core::plugin::predicate::PredicateRegistry;
use crate::core::plugin::source::RouteSource;
use crate::plugins::discovery::memory::MemoryInstanceRegistry;
use crate::plugins::loadbalance::random::RandomBalancer;
use crate::plugins::loadbalance::roundrobin::RoundRobinBalancer;

#[derive(Debug, Eq, PartialEq, Hash)]
pub enum PluginType {
    PluginLoadBalance,
    PluginPredicate,
    PluginFilter,
}

impl Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub trait Plugin
where
    Self: Send + Sync,
{
    fn init(&mut self);

    fn destroy(&self);

    fn name(&self) -> String;
}

/// PluginContainer 按名称登记的负载均衡插件
pub struct PluginContainer {
    loadbalancers: HashMap<String, fn() -> Box<dyn LoadBalancer>>,
}

impl Default for PluginContainer {
    fn default() -> Self {
        let mut c = Self {
            loadbalancers: Default::default(),
        };
        c.register_all_plugin();
        c
    }
}

impl PluginContainer {
    pub fn register_all_plugin(&mut self) {
        self.register_loadbalancer();
    }

    fn register_loadbalancer(&mut self) {
        let vec = vec![RoundRobinBalancer::builder, RandomBalancer::builder];
        for c in vec {
            let (supplier, name) = c();
            self.loadbalancers.insert(name, supplier);
        }
    }

    pub fn register_loadbalancer_supplier(
        &mut self,
        name: &str,
        supplier: fn() -> Box<dyn LoadBalancer>,
    ) {
        self.loadbalancers.insert(name.to_string(), supplier);
    }

    /// new_loadbalancer 创建并初始化一个负载均衡插件实例
    pub fn new_loadbalancer(&self, name: &str) -> Result<Arc<dyn LoadBalancer>, GatewayError> {
        let supplier = self.loadbalancers.get(name).ok_or_else(|| {
            GatewayError::new(
                ErrorCode::PluginError,
                format!("{} plugin {} not found", PluginType::PluginLoadBalance, name),
            )
        })?;
        let mut active = supplier();
        active.init();
        tracing::debug!("[polaris][plugin] load balancer {} initialized", active.name());
        Ok(Arc::from(active))
    }

    pub fn loadbalancer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loadbalancers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Extensions 网关可替换的扩展点，启动时一次性装配
pub struct Extensions {
    pub plugins: PluginContainer,
    pub predicates: PredicateRegistry,
    pub filters: FilterRegistry,
    /// 未设置时根据配置中的路由创建
    pub route_source: Option<Arc<dyn RouteSource>>,
    pub instance_registry: Arc<MemoryInstanceRegistry>,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            plugins: PluginContainer::default(),
            predicates: PredicateRegistry::with_defaults(),
            filters: FilterRegistry::new(),
            route_source: None,
            instance_registry: Arc::new(MemoryInstanceRegistry::new()),
        }
    }
}

impl Extensions {
    pub fn with_route_source(mut self, source: Arc<dyn RouteSource>) -> Self {
        self.route_source = Some(source);
        self
    }

    pub fn with_instance_registry(mut self, registry: Arc<MemoryInstanceRegistry>) -> Self {
        self.instance_registry = registry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_loadbalancers_registered() {
        let container = PluginContainer::default();
        assert_eq!(
            container.loadbalancer_names(),
            vec!["random".to_string(), "roundRobin".to_string()]
        );
        assert_eq!(container.new_loadbalancer("roundRobin").unwrap().name(), "roundRobin");
        let err = container.new_loadbalancer("ringHash").err().unwrap();
        assert_eq!(err.code(), ErrorCode::PluginError);
    }
}
