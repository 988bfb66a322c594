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

use crate::core::plugin::predicate::{PredicateFactory, PredicateRegistry};

pub mod cookie;
pub mod header;
pub mod host;
pub mod method;
pub mod path;
pub(crate) mod pattern;
pub mod query;

/// register_default_predicates 注册内置断言工厂
pub fn register_default_predicates(registry: &mut PredicateRegistry) {
    let factories: Vec<Arc<dyn PredicateFactory>> = vec![
        Arc::new(cookie::CookiePredicateFactory {}),
        Arc::new(header::HeaderPredicateFactory {}),
        Arc::new(host::HostPredicateFactory {}),
        Arc::new(method::MethodPredicateFactory {}),
        Arc::new(path::PathPredicateFactory {}),
        Arc::new(query::QueryPredicateFactory {}),
    ];
    for factory in factories {
        registry.register(factory);
    }
}
