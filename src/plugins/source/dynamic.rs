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

use arc_swap::ArcSwap;

use crate::core::model::{error::GatewayError, exchange::ExchangeContext, route::RouteDefinition};
use crate::core::plugin::source::RouteSource;

/// DynamicRouteSource 由外部推送更新的路由列表
///
/// `update` swaps the whole snapshot; a resolution already holding the old
/// snapshot keeps iterating it unchanged.
pub struct DynamicRouteSource {
    definitions: ArcSwap<Vec<RouteDefinition>>,
}

impl DynamicRouteSource {
    pub fn new(definitions: Vec<RouteDefinition>) -> Self {
        Self {
            definitions: ArcSwap::from_pointee(definitions),
        }
    }

    pub fn update(&self, definitions: Vec<RouteDefinition>) {
        tracing::info!(
            "[polaris][gateway] route definitions updated, count: {}",
            definitions.len()
        );
        self.definitions.store(Arc::new(definitions));
    }

    pub fn current(&self) -> Arc<Vec<RouteDefinition>> {
        self.definitions.load_full()
    }
}

impl Default for DynamicRouteSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait::async_trait]
impl RouteSource for DynamicRouteSource {
    async fn list_definitions(
        &self,
        _exchange: &ExchangeContext,
    ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError> {
        Ok(self.current())
    }
}
