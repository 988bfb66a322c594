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

use http::Method;

use crate::core::model::{
    error::{EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::{ComponentArgs, ShortcutType},
};
use crate::core::plugin::predicate::{AsyncPredicate, PredicateFactory};

pub const PREDICATE_METHOD: &str = "Method";

/// MethodPredicateFactory `Method=GET,POST`
pub struct MethodPredicateFactory {}

impl PredicateFactory for MethodPredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_METHOD
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["methods"]
    }

    fn shortcut_type(&self) -> ShortcutType {
        ShortcutType::GatherList
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        let methods = args
            .list("methods")?
            .iter()
            .map(|method| {
                Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
                    GatewayError::invalid_argument(format!("invalid http method {}", method))
                })
            })
            .collect::<Result<Vec<Method>, GatewayError>>()?;
        Ok(Arc::new(MethodPredicate { methods }))
    }
}

struct MethodPredicate {
    methods: Vec<Method>,
}

#[async_trait::async_trait]
impl AsyncPredicate for MethodPredicate {
    fn name(&self) -> &str {
        PREDICATE_METHOD
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        Ok(self.methods.contains(exchange.method()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_methods_case_insensitive() {
        let predicate = MethodPredicateFactory {}
            .apply(&ComponentArgs::from_pairs(&[("methods", "get, Post")]))
            .unwrap();
        let get = ExchangeContext::new(Method::GET, http::Uri::from_static("/"));
        let put = ExchangeContext::new(Method::PUT, http::Uri::from_static("/"));
        assert!(predicate.test(&get).await.unwrap());
        assert!(!predicate.test(&put).await.unwrap());

        assert!(MethodPredicateFactory {}
            .apply(&ComponentArgs::from_pairs(&[("methods", "GE T")]))
            .is_err());
    }
}
