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
use std::fmt;
use std::sync::Arc;

use crate::core::model::{
    error::GatewayError,
    exchange::ExchangeContext,
    route::{ComponentArgs, ShortcutType},
};

/// GatewayFilter 路由选中后作用于请求的过滤器
///
/// Lower `order` runs first.
#[async_trait::async_trait]
pub trait GatewayFilter: Send + Sync {
    fn name(&self) -> &str;

    fn order(&self) -> i32 {
        0
    }

    async fn filter(&self, exchange: &mut ExchangeContext) -> Result<(), GatewayError>;
}

/// FilterFactory 根据命名参数构造过滤器
pub trait FilterFactory: Send + Sync {
    fn name(&self) -> &str;

    fn shortcut_fields(&self) -> &[&'static str] {
        &[]
    }

    fn shortcut_type(&self) -> ShortcutType {
        ShortcutType::Default
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn GatewayFilter>, GatewayError>;
}

/// FilterRegistry 过滤器工厂注册表，启动时填充，之后只读
#[derive(Clone, Default)]
pub struct FilterRegistry {
    factories: HashMap<String, Arc<dyn FilterFactory>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn FilterFactory>) -> Option<Arc<dyn FilterFactory>> {
        self.factories.insert(factory.name().to_string(), factory)
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn FilterFactory>> {
        self.factories.get(name).cloned()
    }
}

/// FilterChain 按优先级排好序的过滤器链
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn GatewayFilter>>,
}

impl FilterChain {
    /// new 稳定排序：order 相同的过滤器保持定义顺序
    pub fn new(mut filters: Vec<Arc<dyn GatewayFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    pub fn filters(&self) -> &[Arc<dyn GatewayFilter>] {
        &self.filters
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// apply 依次执行过滤器，遇到第一个错误即停止
    pub async fn apply(&self, exchange: &mut ExchangeContext) -> Result<(), GatewayError> {
        for filter in self.filters.iter() {
            filter.filter(exchange).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
