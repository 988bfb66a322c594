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

use crate::core::model::{error::GatewayError, exchange::ExchangeContext, route::RouteDefinition};

/// RouteSource 提供当前请求可见的路由定义
///
/// The returned snapshot must not change while the resolver iterates it; the
/// output may depend on request attributes such as the host.
#[async_trait::async_trait]
pub trait RouteSource: Send + Sync {
    async fn list_definitions(
        &self,
        exchange: &ExchangeContext,
    ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError>;

    /// lists_all_routes 每次返回的都是完整路由集合，而不是按请求筛选的子集
    ///
    /// The resolver drops cached routes missing from a complete listing.
    fn lists_all_routes(&self) -> bool {
        true
    }
}

/// RouteDefinitionLoader 从外部存储拉取完整的路由定义列表
#[async_trait::async_trait]
pub trait RouteDefinitionLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<RouteDefinition>, GatewayError>;
}
