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

use url::Url;

use crate::core::context::GatewayContext;
use crate::core::model::{
    error::{ErrorCode, GatewayError},
    exchange::ExchangeContext,
    naming::ServiceInstance,
    route::Upstream,
};
use crate::gateway::api::GatewayAPI;
use crate::gateway::req::{RouteRequest, RouteResponse, RoutesResponse};

pub struct DefaultGatewayAPI {
    context: Arc<GatewayContext>,
}

impl DefaultGatewayAPI {
    pub fn new_raw(context: GatewayContext) -> Self {
        Self::new(Arc::new(context))
    }

    pub fn new(context: Arc<GatewayContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl GatewayAPI for DefaultGatewayAPI {
    async fn route(&self, req: RouteRequest) -> Result<Option<RouteResponse>, GatewayError> {
        let engine = self.context.get_engine();
        let matched = match &req.cancel {
            Some(token) => {
                engine
                    .get_resolver()
                    .resolve_first_with_cancel(&req.exchange, token)
                    .await?
            }
            None => engine.resolve_route(&req.exchange).await,
        };
        let Some(route) = matched else {
            tracing::debug!(
                "[polaris][gateway] flow {} no route matched {} {}",
                req.flow_id,
                req.exchange.method(),
                req.exchange.path()
            );
            return Ok(None);
        };

        let instance = match route.upstream() {
            Upstream::LoadBalanced { service_name, .. } => Some(engine.select_instance(service_name)?),
            Upstream::Direct(_) => None,
        };
        let target = target_url(route.upstream(), instance.as_ref(), &req.exchange)?;
        tracing::debug!(
            "[polaris][gateway] flow {} route {} forward to {}",
            req.flow_id,
            route.id(),
            target
        );
        Ok(Some(RouteResponse {
            route,
            instance,
            target,
        }))
    }

    async fn routes(&self, req: RouteRequest) -> Result<RoutesResponse, GatewayError> {
        let routes = self
            .context
            .get_engine()
            .resolve_all_routes(&req.exchange)
            .await;
        Ok(RoutesResponse { routes })
    }

    fn select_instance(&self, service_name: &str) -> Result<ServiceInstance, GatewayError> {
        self.context.get_engine().select_instance(service_name)
    }
}

/// target_url 用实例或路由 URI 的 scheme/host/port 拼上请求的 path 与 query
fn target_url(
    upstream: &Upstream,
    instance: Option<&ServiceInstance>,
    exchange: &ExchangeContext,
) -> Result<Url, GatewayError> {
    let mut target = match instance {
        Some(instance) => Url::parse(&instance.uri()).map_err(|err| {
            GatewayError::new(
                ErrorCode::InternalError,
                format!("instance {} has invalid address: {}", instance.instance_id, err),
            )
        })?,
        None => upstream.uri().clone(),
    };
    target.set_path(exchange.path());
    target.set_query(exchange.query());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::core::config::config::{load_from_str, Configuration};
    use crate::core::model::route::{ComponentArgs, ShortcutType};
    use crate::core::plugin::filter::{FilterFactory, GatewayFilter};
    use crate::core::plugin::plugins::Extensions;
    use crate::gateway::api::new_gateway_api_by_config;

    const GATEWAY_YAML: &str = r#"
gateway:
  routes:
    - id: a
      order: 1
      uri: lb://myservice
      predicates:
        - name: Cookie
          args:
            name: mycookie
            value: mycookievalue
    - id: literal
      order: 2
      uri: https://backend.example.org:8443
      predicates:
        - Path=/red/**
    - id: ghost
      order: 3
      uri: lb://ghost
      predicates:
        - Path=/ghost/**
loadbalancer:
  services:
    myservice:
      - instanceId: myservice-1
        host: platform.example.com
        port: 18900
      - instanceId: myservice-2
        host: www.example.com
        port: 18900
"#;

    fn config() -> Configuration {
        load_from_str(GATEWAY_YAML).unwrap()
    }

    fn request(uri: &str, cookie: Option<&str>) -> RouteRequest {
        let mut builder = http::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        RouteRequest::from_request(&builder.body(()).unwrap())
    }

    #[tokio::test]
    async fn test_cookie_route_to_static_instances() {
        let api = new_gateway_api_by_config(config()).unwrap();

        let rsp = api
            .route(request("/orders?id=7", Some("mycookie=mycookievalue")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rsp.route_id(), "a");
        assert_eq!(rsp.instance.as_ref().unwrap().host, "platform.example.com");
        assert_eq!(rsp.target.as_str(), "http://platform.example.com:18900/orders?id=7");

        let rsp = api
            .route(request("/orders", Some("mycookie=mycookievalue")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rsp.instance.unwrap().instance_id, "myservice-2");
    }

    #[tokio::test]
    async fn test_literal_route_and_no_match() {
        let api = new_gateway_api_by_config(config()).unwrap();

        let rsp = api.route(request("/red/1?x=y", None)).await.unwrap().unwrap();
        assert_eq!(rsp.route_id(), "literal");
        assert!(rsp.instance.is_none());
        assert_eq!(rsp.target.as_str(), "https://backend.example.org:8443/red/1?x=y");

        assert!(api.route(request("/blue", None)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_instances_is_surfaced() {
        let api = new_gateway_api_by_config(config()).unwrap();
        let err = api.route(request("/ghost/1", None)).await.err().unwrap();
        assert_eq!(err.code(), ErrorCode::NoInstancesAvailable);
        assert_eq!(err.service(), Some("ghost"));
    }

    #[tokio::test]
    async fn test_routes_enumerates_in_order() {
        let api = new_gateway_api_by_config(config()).unwrap();
        let rsp = api
            .routes(request("/red/2", Some("mycookie=mycookievalue")))
            .await
            .unwrap();
        assert_eq!(rsp.route_ids(), vec!["a", "literal"]);
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let api = new_gateway_api_by_config(config()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = api
            .route(request("/red/1", None).with_cancel(token))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::ResolveCancelled);
    }

    #[tokio::test]
    async fn test_discovered_instances_preferred() {
        let context = Arc::new(GatewayContext::create_by_configuration(config()).unwrap());
        context.get_engine().get_instance_registry().update_service(
            "myservice",
            vec![ServiceInstance::new("myservice", "dyn-1", "10.0.0.8", 8080, true)],
        );
        let api = DefaultGatewayAPI::new(context);
        let rsp = api
            .route(request("/", Some("mycookie=mycookievalue")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rsp.target.as_str(), "https://10.0.0.8:8080/");
        assert_eq!(api.select_instance("myservice").unwrap().instance_id, "dyn-1");
    }

    struct SetHeaderFilter {
        header: http::header::HeaderName,
        value: http::header::HeaderValue,
    }

    #[async_trait::async_trait]
    impl GatewayFilter for SetHeaderFilter {
        fn name(&self) -> &str {
            "SetRequestHeader"
        }

        async fn filter(&self, exchange: &mut ExchangeContext) -> Result<(), GatewayError> {
            exchange.headers_mut().insert(self.header.clone(), self.value.clone());
            Ok(())
        }
    }

    struct SetHeaderFilterFactory {}

    impl FilterFactory for SetHeaderFilterFactory {
        fn name(&self) -> &str {
            "SetRequestHeader"
        }

        fn shortcut_fields(&self) -> &[&'static str] {
            &["name", "value"]
        }

        fn shortcut_type(&self) -> ShortcutType {
            ShortcutType::Default
        }

        fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn GatewayFilter>, GatewayError> {
            let header = http::header::HeaderName::from_bytes(args.required("name")?.as_bytes())
                .map_err(|err| GatewayError::invalid_argument(err.to_string()))?;
            let value = http::header::HeaderValue::from_str(args.required("value")?)
                .map_err(|err| GatewayError::invalid_argument(err.to_string()))?;
            Ok(Arc::new(SetHeaderFilter { header, value }))
        }
    }

    #[tokio::test]
    async fn test_default_filters_from_extensions() {
        let mut conf = config();
        conf.gateway.default_filters = vec![
            crate::core::model::route::FilterSpec::parse("SetRequestHeader=X-Gateway,polaris").unwrap(),
        ];
        let mut extensions = Extensions::default();
        extensions.filters.register(Arc::new(SetHeaderFilterFactory {}));
        let context = GatewayContext::create_by_extensions(conf, extensions).unwrap();
        let api = DefaultGatewayAPI::new_raw(context);

        let req = request("/red/1", None);
        let mut exchange = req.exchange.clone();
        let rsp = api.route(req).await.unwrap().unwrap();
        assert_eq!(rsp.filters().names(), vec!["SetRequestHeader"]);
        rsp.apply_filters(&mut exchange).await.unwrap();
        assert_eq!(exchange.headers()["x-gateway"], "polaris");
    }
}
