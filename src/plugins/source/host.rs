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
use std::sync::Arc;

use crate::core::model::{error::GatewayError, exchange::ExchangeContext, route::RouteDefinition};
use crate::core::plugin::source::RouteSource;

/// HostRouteSource 按请求主机名提供不同的路由列表
///
/// Lookup order: the exact host (case-insensitive, port ignored), then the
/// `*.suffix` wildcard with the longest matching suffix, then the fallback
/// list. A wildcard never matches the bare suffix itself.
pub struct HostRouteSource {
    exact: HashMap<String, Arc<Vec<RouteDefinition>>>,
    // 按后缀长度降序
    wildcards: Vec<(String, Arc<Vec<RouteDefinition>>)>,
    fallback: Arc<Vec<RouteDefinition>>,
}

impl HostRouteSource {
    pub fn new(
        host_routes: HashMap<String, Vec<RouteDefinition>>,
        fallback: Vec<RouteDefinition>,
    ) -> Self {
        let mut exact = HashMap::new();
        let mut wildcards = Vec::new();
        for (host, definitions) in host_routes {
            let host = host.trim().to_ascii_lowercase();
            let definitions = Arc::new(definitions);
            match host.strip_prefix("*.") {
                Some(suffix) => wildcards.push((format!(".{}", suffix), definitions)),
                None => {
                    exact.insert(host, definitions);
                }
            }
        }
        wildcards.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self {
            exact,
            wildcards,
            fallback: Arc::new(fallback),
        }
    }

    fn select(&self, host: Option<&str>) -> Arc<Vec<RouteDefinition>> {
        let Some(host) = host else {
            return self.fallback.clone();
        };
        if let Some(definitions) = self.exact.get(host) {
            return definitions.clone();
        }
        self.wildcards
            .iter()
            .find(|(suffix, _)| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
            .map(|(_, definitions)| definitions.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait::async_trait]
impl RouteSource for HostRouteSource {
    async fn list_definitions(
        &self,
        exchange: &ExchangeContext,
    ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError> {
        let host = exchange.host();
        let definitions = self.select(host.as_deref());
        tracing::trace!(
            "[polaris][gateway] host {:?} selects {} route definitions",
            host,
            definitions.len()
        );
        Ok(definitions)
    }

    fn lists_all_routes(&self) -> bool {
        false
    }
}
