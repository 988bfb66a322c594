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

use crate::core::config::config::Configuration;
use crate::core::model::{error::GatewayError, exchange::ExchangeContext, naming::ServiceInstance};
use crate::core::plugin::plugins::Extensions;
use crate::core::plugin::source::RouteSource;
use crate::core::route::{
    compiler::{CompiledRoute, DefaultRouteCompiler},
    predicate::PredicateCompiler,
    resolver::RouteResolver,
};
use crate::core::selector::InstanceSelector;
use crate::plugins::discovery::{memory::MemoryInstanceRegistry, static_config::StaticInstanceConfig};
use crate::plugins::source::{host::HostRouteSource, static_source::StaticRouteSource};

/// Engine 按配置装配好的路由解析与实例选择
pub struct Engine
where
    Self: Send + Sync,
{
    resolver: Arc<RouteResolver>,
    selector: Arc<InstanceSelector>,
    instance_registry: Arc<MemoryInstanceRegistry>,
}

impl Engine {
    pub fn new(arc_conf: Arc<Configuration>, extensions: Extensions) -> Result<Self, GatewayError> {
        let Extensions {
            plugins,
            predicates,
            filters,
            route_source,
            instance_registry,
        } = extensions;

        let predicate_compiler = PredicateCompiler::new(Arc::new(predicates))
            .with_evaluation_timeout(arc_conf.global.resolver.predicate_timeout);
        let compiler = DefaultRouteCompiler::new(predicate_compiler, Arc::new(filters))
            .with_default_filters(arc_conf.gateway.default_filters.clone());

        let source = route_source.unwrap_or_else(|| build_route_source(&arc_conf));
        let resolver = RouteResolver::new(source, Arc::new(compiler));

        let balancer = plugins.new_loadbalancer(&arc_conf.loadbalancer.default_policy)?;
        let static_instances = StaticInstanceConfig::new(arc_conf.loadbalancer.services.clone());
        let selector = InstanceSelector::new(
            instance_registry.clone(),
            Arc::new(static_instances),
            balancer,
        );

        tracing::info!(
            "[polaris][gateway] engine started, routes: {}, host routes: {}, load balancer: {}",
            arc_conf.gateway.routes.len(),
            arc_conf.gateway.host_routes.len(),
            selector.balancer_name()
        );

        Ok(Self {
            resolver: Arc::new(resolver),
            selector: Arc::new(selector),
            instance_registry,
        })
    }

    /// resolve_route 首个匹配的路由
    pub async fn resolve_route(&self, exchange: &ExchangeContext) -> Option<Arc<CompiledRoute>> {
        self.resolver.resolve_first(exchange).await
    }

    pub async fn resolve_all_routes(&self, exchange: &ExchangeContext) -> Vec<Arc<CompiledRoute>> {
        self.resolver.resolve_all(exchange).await
    }

    pub fn select_instance(&self, service_name: &str) -> Result<ServiceInstance, GatewayError> {
        self.selector.select(service_name)
    }

    pub fn get_resolver(&self) -> Arc<RouteResolver> {
        self.resolver.clone()
    }

    pub fn get_selector(&self) -> Arc<InstanceSelector> {
        self.selector.clone()
    }

    /// get_instance_registry 供服务发现子系统推送实例
    pub fn get_instance_registry(&self) -> Arc<MemoryInstanceRegistry> {
        self.instance_registry.clone()
    }
}

fn build_route_source(conf: &Configuration) -> Arc<dyn RouteSource> {
    let gateway = &conf.gateway;
    if gateway.host_routes.is_empty() {
        return Arc::new(StaticRouteSource::new(gateway.routes.clone()));
    }
    Arc::new(HostRouteSource::new(
        gateway.host_routes.clone(),
        gateway.routes.clone(),
    ))
}
