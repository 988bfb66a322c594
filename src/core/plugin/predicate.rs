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

use crate::core::model::{
    error::{EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::{ComponentArgs, ShortcutType},
};

/// AsyncPredicate 路由断言，求值可能挂起（例如需要访问外部白名单）
///
/// Implementations must be side-effect free and safe to evaluate from many
/// requests concurrently.
#[async_trait::async_trait]
pub trait AsyncPredicate: Send + Sync {
    fn name(&self) -> &str;

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError>;
}

/// PredicateFactory 根据命名参数构造断言
pub trait PredicateFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Field names that `Name=a,b` shortcut values bind to, in order.
    fn shortcut_fields(&self) -> &[&'static str] {
        &[]
    }

    fn shortcut_type(&self) -> ShortcutType {
        ShortcutType::Default
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError>;
}

/// PredicateRegistry 断言工厂注册表
///
/// Populated once at startup and shared behind an `Arc` afterwards; there is no
/// interior mutability, so concurrent reads need no locking.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    factories: HashMap<String, Arc<dyn PredicateFactory>>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// with_defaults 注册所有内置断言
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::plugins::predicate::register_default_predicates(&mut registry);
        registry
    }

    /// register 按工厂自身名称注册，返回被替换的旧工厂
    pub fn register(&mut self, factory: Arc<dyn PredicateFactory>) -> Option<Arc<dyn PredicateFactory>> {
        let name = factory.name().to_string();
        self.register_named(&name, factory)
    }

    pub fn register_named(
        &mut self,
        name: &str,
        factory: Arc<dyn PredicateFactory>,
    ) -> Option<Arc<dyn PredicateFactory>> {
        let replaced = self.factories.insert(name.to_string(), factory);
        if replaced.is_some() {
            tracing::debug!("[polaris][plugin] predicate factory {} replaced", name);
        }
        replaced
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn PredicateFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
