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

use http::Request;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::model::{
    error::GatewayError, exchange::ExchangeContext, naming::ServiceInstance,
};
use crate::core::plugin::filter::FilterChain;
use crate::core::route::compiler::CompiledRoute;

#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub flow_id: String,
    pub exchange: ExchangeContext,
    // 请求被取消（客户端断开、超时）时由分发层触发
    pub cancel: Option<CancellationToken>,
}

impl RouteRequest {
    pub fn new(exchange: ExchangeContext) -> Self {
        Self {
            flow_id: uuid::Uuid::new_v4().to_string(),
            exchange,
            cancel: None,
        }
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::new(ExchangeContext::from_request(req))
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// RouteResponse 请求命中的路由及转发目标
#[derive(Clone, Debug)]
pub struct RouteResponse {
    pub route: Arc<CompiledRoute>,
    /// 负载均衡路由选中的实例，字面地址路由为空
    pub instance: Option<ServiceInstance>,
    /// 转发地址：scheme/host/port 来自实例或路由 URI，path 与 query 来自原请求
    pub target: Url,
}

impl RouteResponse {
    pub fn route_id(&self) -> &str {
        self.route.id()
    }

    pub fn filters(&self) -> &FilterChain {
        self.route.filters()
    }

    /// apply_filters 按优先级执行路由的过滤器链
    pub async fn apply_filters(&self, exchange: &mut ExchangeContext) -> Result<(), GatewayError> {
        self.route.filters().apply(exchange).await
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoutesResponse {
    pub routes: Vec<Arc<CompiledRoute>>,
}

impl RoutesResponse {
    pub fn route_ids(&self) -> Vec<&str> {
        self.routes.iter().map(|route| route.id()).collect()
    }
}
