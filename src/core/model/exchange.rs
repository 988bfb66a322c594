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
use std::net::SocketAddr;

use http::header::{COOKIE, HOST};
use http::{HeaderMap, Method, Request, Uri};

/// ExchangeContext 一次入站请求在路由阶段可见的数据
///
/// Predicates only read it; filters may mutate it once a route is selected.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    attributes: HashMap<String, String>,
}

impl ExchangeContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            remote_addr: None,
            attributes: HashMap::new(),
        }
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
            remote_addr: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.attributes
    }

    /// host 请求的主机名，优先取绝对 URI，其次取 Host 头，去掉端口并转小写
    pub fn host(&self) -> Option<String> {
        if let Some(host) = self.uri.host() {
            return Some(host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase());
        }
        let raw = self.headers.get(HOST)?.to_str().ok()?.trim();
        let host = match raw.strip_prefix('[') {
            // [::1]:8080
            Some(rest) => rest.split(']').next().unwrap_or(rest),
            None => raw.split(':').next().unwrap_or(raw),
        };
        if host.is_empty() {
            return None;
        }
        Some(host.to_ascii_lowercase())
    }

    /// header_values 指定请求头的所有可读值
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// cookie_values 从所有 Cookie 头中取出指定名称的值
    pub fn cookie_values(&self, name: &str) -> Vec<String> {
        let mut values = Vec::new();
        for header in self.headers.get_all(COOKIE).iter() {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                if let Some((key, value)) = pair.trim().split_once('=') {
                    if key.trim() == name {
                        values.push(value.trim().trim_matches('"').to_string());
                    }
                }
            }
        }
        values
    }

    /// query_values 查询参数的所有值（已做 URL 解码）
    pub fn query_values(&self, name: &str) -> Vec<String> {
        let Some(query) = self.uri.query() else {
            return Vec::new();
        };
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        !self.query_values(name).is_empty()
    }
}
