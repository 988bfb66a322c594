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

//! Route resolution and load-balanced upstream selection for Polaris gateways.
//!
//! A request is matched against route definitions in ascending `order`; each
//! definition is compiled once into a predicate conjunction plus an ordered
//! filter chain. Routes pointing at `lb://<service>` are forwarded to an
//! instance picked round-robin from the discovered instances, falling back to
//! statically configured ones.
//!
//! ```no_run
//! use polaris_gateway::core::config::config::load_from_str;
//! use polaris_gateway::gateway::api::{new_gateway_api_by_config, GatewayAPI};
//! use polaris_gateway::gateway::req::RouteRequest;
//!
//! # async fn demo() -> Result<(), polaris_gateway::core::model::error::GatewayError> {
//! let conf = load_from_str(
//!     r#"
//! gateway:
//!   routes:
//!     - id: api
//!       uri: lb://myservice
//!       predicates: [ "Path=/api/**" ]
//! loadbalancer:
//!   services:
//!     myservice:
//!       - { instanceId: myservice-1, host: 127.0.0.1, port: 18900 }
//! "#,
//! )?;
//! let api = new_gateway_api_by_config(conf)?;
//! let req = http::Request::builder().uri("/api/users").body(()).unwrap();
//! if let Some(rsp) = api.route(RouteRequest::from_request(&req)).await? {
//!     println!("{} -> {}", rsp.route_id(), rsp.target);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod gateway;
pub mod plugins;
