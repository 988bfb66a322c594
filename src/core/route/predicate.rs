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

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::core::model::{
    error::{CompilationError, CompilationErrorKind, EvaluationError},
    exchange::ExchangeContext,
    route::{ComponentArgs, PredicateSpec},
};
use crate::core::plugin::predicate::{AsyncPredicate, PredicateRegistry};

/// RoutePredicate 一条路由编译后的断言：所有子断言的短路与
///
/// An empty conjunction is the catch-all predicate and matches every request.
#[derive(Clone, Default)]
pub struct RoutePredicate {
    predicates: Vec<Arc<dyn AsyncPredicate>>,
    timeout: Option<Duration>,
}

impl RoutePredicate {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn is_catch_all(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// test 从左到右求值，遇到 false 或错误立即返回，后续断言不会被启动
    pub async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        for predicate in self.predicates.iter() {
            let matched = match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, predicate.test(exchange))
                    .await
                    .map_err(|_| {
                        EvaluationError::new(
                            predicate.name(),
                            format!("evaluation timed out after {:?}", timeout),
                        )
                    })??,
                None => predicate.test(exchange).await?,
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for RoutePredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "Always");
        }
        let names: Vec<&str> = self.predicates.iter().map(|p| p.name()).collect();
        write!(f, "{}", names.join(" && "))
    }
}

/// PredicateCompiler 把一条路由的断言定义绑定到工厂并组合
#[derive(Clone)]
pub struct PredicateCompiler {
    registry: Arc<PredicateRegistry>,
    evaluation_timeout: Option<Duration>,
}

impl PredicateCompiler {
    pub fn new(registry: Arc<PredicateRegistry>) -> Self {
        Self {
            registry,
            evaluation_timeout: None,
        }
    }

    /// with_evaluation_timeout 单个断言的求值超时，超时视为求值错误
    pub fn with_evaluation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.evaluation_timeout = timeout;
        self
    }

    pub fn compile(
        &self,
        route_id: &str,
        specs: &[PredicateSpec],
    ) -> Result<RoutePredicate, CompilationError> {
        let mut predicates = Vec::with_capacity(specs.len());
        for spec in specs.iter() {
            let factory = self.registry.resolve(&spec.name).ok_or_else(|| {
                CompilationError::new(
                    route_id,
                    &spec.name,
                    CompilationErrorKind::UnknownPredicate,
                    "predicate factory is not registered".to_string(),
                )
            })?;
            tracing::debug!(
                "[polaris][gateway] route definition {} applying {:?} to {}",
                route_id,
                spec.args,
                spec.name
            );
            let invalid_args = |err: crate::core::model::error::GatewayError| {
                CompilationError::new(
                    route_id,
                    &spec.name,
                    CompilationErrorKind::InvalidPredicateArgs,
                    err.message().to_string(),
                )
            };
            let args = ComponentArgs::bind(
                &spec.args,
                factory.shortcut_fields(),
                factory.shortcut_type(),
            )
            .map_err(invalid_args)?;
            predicates.push(factory.apply(&args).map_err(invalid_args)?);
        }
        Ok(RoutePredicate {
            predicates,
            timeout: self.evaluation_timeout,
        })
    }
}
