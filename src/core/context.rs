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

use crate::core::config::config::{load_default, Configuration};
use crate::core::engine::Engine;
use crate::core::model::error::GatewayError;
use crate::core::plugin::plugins::Extensions;

/// GatewayContext 网关运行时上下文，持有配置和引擎
pub struct GatewayContext {
    conf: Arc<Configuration>,
    engine: Engine,
}

impl GatewayContext {
    /// default 使用默认配置，见 [`load_default`]
    pub fn default() -> Result<GatewayContext, GatewayError> {
        Self::create_by_configuration(load_default()?)
    }

    pub fn create_by_configuration(cfg: Configuration) -> Result<GatewayContext, GatewayError> {
        Self::create_by_extensions(cfg, Extensions::default())
    }

    /// create_by_extensions 使用自定义的断言、过滤器或路由来源
    pub fn create_by_extensions(
        cfg: Configuration,
        extensions: Extensions,
    ) -> Result<GatewayContext, GatewayError> {
        let conf = Arc::new(cfg);
        let engine = Engine::new(conf.clone(), extensions)?;
        Ok(Self { conf, engine })
    }

    pub fn get_conf(&self) -> Arc<Configuration> {
        self.conf.clone()
    }

    pub fn get_engine(&self) -> &Engine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::config::load_from_str;
    use crate::core::model::error::ErrorCode;

    #[test]
    fn test_unknown_load_balancer_policy() {
        let conf = load_from_str("loadbalancer:\n  defaultPolicy: ringHash\n").unwrap();
        let err = GatewayContext::create_by_configuration(conf).err().unwrap();
        assert_eq!(err.code(), ErrorCode::PluginError);
    }

    #[tokio::test]
    async fn test_host_routes_select_route_source() {
        let conf = load_from_str(
            r#"
gateway:
  routes:
    - id: fallback
      uri: lb://myservice
  hostRoutes:
    api.example.com:
      - id: api
        uri: lb://api
"#,
        )
        .unwrap();
        let context = GatewayContext::create_by_configuration(conf).unwrap();
        let engine = context.get_engine();

        let api = http::Request::builder()
            .uri("/")
            .header(http::header::HOST, "api.example.com")
            .body(())
            .unwrap();
        let exchange = crate::core::model::exchange::ExchangeContext::from_request(&api);
        assert_eq!(engine.resolve_route(&exchange).await.unwrap().id(), "api");

        let other = crate::core::model::exchange::ExchangeContext::new(
            http::Method::GET,
            http::Uri::from_static("http://www.example.com/"),
        );
        assert_eq!(engine.resolve_route(&other).await.unwrap().id(), "fallback");
    }
}
