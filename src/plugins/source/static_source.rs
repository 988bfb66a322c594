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
use crate::core::plugin::source::RouteSource;

/// StaticRouteSource 固定的路由列表，与请求无关
pub struct StaticRouteSource {
    definitions: Arc<Vec<RouteDefinition>>,
}

impl StaticRouteSource {
    pub fn new(definitions: Vec<RouteDefinition>) -> Self {
        Self {
            definitions: Arc::new(definitions),
        }
    }
}

#[async_trait::async_trait]
impl RouteSource for StaticRouteSource {
    async fn list_definitions(
        &self,
        _exchange: &ExchangeContext,
    ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError> {
        Ok(self.definitions.clone())
    }
}
