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
use crate::core::context::GatewayContext;
use crate::core::model::{error::GatewayError, naming::ServiceInstance};
use crate::gateway::default::DefaultGatewayAPI;
use crate::gateway::req::{RouteRequest, RouteResponse, RoutesResponse};

/// new_gateway_api 使用默认配置创建
pub fn new_gateway_api() -> Result<impl GatewayAPI, GatewayError> {
    let start_time = std::time::Instant::now();
    let context = GatewayContext::default()?;
    tracing::info!("create gateway context cost: {:?}", start_time.elapsed());
    Ok(DefaultGatewayAPI::new_raw(context))
}

pub fn new_gateway_api_by_config(conf: Configuration) -> Result<impl GatewayAPI, GatewayError> {
    let context = GatewayContext::create_by_configuration(conf)?;
    Ok(DefaultGatewayAPI::new_raw(context))
}

pub fn new_gateway_api_by_context(
    context: Arc<GatewayContext>,
) -> Result<impl GatewayAPI, GatewayError> {
    Ok(DefaultGatewayAPI::new(context))
}

/// GatewayAPI 供 HTTP 分发层调用的路由入口
#[async_trait::async_trait]
pub trait GatewayAPI
where
    Self: Send + Sync,
{
    /// route 解析首个匹配路由，负载均衡路由同时选出上游实例
    ///
    /// `Ok(None)` means no route matched; the dispatch layer decides between a
    /// 404 and a default route. A matched load-balanced route without any
    /// instance fails with `NoInstancesAvailable`.
    async fn route(&self, req: RouteRequest) -> Result<Option<RouteResponse>, GatewayError>;

    /// routes 按顺序枚举所有匹配路由，供管理和排障使用
    async fn routes(&self, req: RouteRequest) -> Result<RoutesResponse, GatewayError>;

    /// select_instance 为逻辑服务选择一个实例
    fn select_instance(&self, service_name: &str) -> Result<ServiceInstance, GatewayError>;
}
