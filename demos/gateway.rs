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

use polaris_gateway::{
    core::{
        config::config::load_from_str,
        context::GatewayContext,
        logger::logger::init_console_logger,
        model::{
            naming::ServiceInstance,
            route::{PredicateSpec, RouteDefinition},
        },
        plugin::plugins::Extensions,
    },
    gateway::{
        api::{new_gateway_api_by_context, GatewayAPI},
        req::RouteRequest,
    },
    plugins::source::dynamic::DynamicRouteSource,
};
use tracing::level_filters::LevelFilter;

const DEMO_CONFIG: &str = r#"
global:
  resolver:
    predicateTimeout: 2s
loadbalancer:
  defaultPolicy: roundRobin
  services:
    myservice:
      - instanceId: myservice-1
        host: platform.example.com
        port: 18900
      - instanceId: myservice-2
        host: www.example.com
        port: 18900
"#;

fn request(path: &str, cookie: Option<&str>) -> RouteRequest {
    let mut builder = http::Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(http::header::COOKIE, cookie);
    }
    RouteRequest::from_request(&builder.body(()).expect("valid demo request"))
}

async fn dispatch(api: &impl GatewayAPI, req: RouteRequest) {
    let path = req.exchange.path().to_string();
    match api.route(req).await {
        Ok(Some(rsp)) => tracing::info!("{} -> route {} target {}", path, rsp.route_id(), rsp.target),
        Ok(None) => tracing::info!("{} -> no route, respond 404", path),
        Err(err) => tracing::error!("{} -> route fail: {}", path, err),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_console_logger(LevelFilter::DEBUG)?;

    let source = Arc::new(DynamicRouteSource::new(vec![
        RouteDefinition::new("cookie_route", "lb://myservice")
            .with_order(1)
            .with_predicate(PredicateSpec::parse("Cookie=mycookie,mycookievalue")?),
        // 未注册的断言只会让这条路由被跳过
        RouteDefinition::new("weighted", "lb://myservice")
            .with_predicate(PredicateSpec::parse("Weight=group1,8")?),
    ]));

    let conf = load_from_str(DEMO_CONFIG)?;
    let extensions = Extensions::default().with_route_source(source.clone());
    let context = Arc::new(GatewayContext::create_by_extensions(conf, extensions)?);
    let api = new_gateway_api_by_context(context.clone())?;

    for _ in 0..3 {
        dispatch(&api, request("/orders", Some("mycookie=mycookievalue"))).await;
    }
    dispatch(&api, request("/orders", None)).await;

    // 推送新的路由和服务发现结果
    source.update(vec![
        RouteDefinition::new("orders", "lb://orders")
            .with_predicate(PredicateSpec::parse("Path=/orders/**")?),
        RouteDefinition::new("docs", "https://docs.example.com").with_order(10),
    ]);
    context.get_engine().get_instance_registry().update_service(
        "orders",
        vec![ServiceInstance::new("orders", "orders-1", "10.0.0.21", 8080, false)],
    );

    dispatch(&api, request("/orders/42", None)).await;
    dispatch(&api, request("/guide/index.html?lang=en", None)).await;

    let all = api.routes(request("/orders/42", None)).await?;
    tracing::info!("all matched routes: {:?}", all.route_ids());
    Ok(())
}
