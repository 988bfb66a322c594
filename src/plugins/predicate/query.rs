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

use regex::Regex;

use crate::core::model::{
    error::{EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::ComponentArgs,
};
use crate::core::plugin::predicate::{AsyncPredicate, PredicateFactory};

use super::pattern::full_match_regex;

pub const PREDICATE_QUERY: &str = "Query";

/// QueryPredicateFactory `Query=param[,regexp]`
pub struct QueryPredicateFactory {}

impl PredicateFactory for QueryPredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_QUERY
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["param", "regexp"]
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        Ok(Arc::new(QueryPredicate {
            param: args.required("param")?.to_string(),
            regexp: args.optional("regexp").map(full_match_regex).transpose()?,
        }))
    }
}

struct QueryPredicate {
    param: String,
    regexp: Option<Regex>,
}

#[async_trait::async_trait]
impl AsyncPredicate for QueryPredicate {
    fn name(&self) -> &str {
        PREDICATE_QUERY
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        let values = exchange.query_values(&self.param);
        Ok(match &self.regexp {
            None => !values.is_empty(),
            Some(regexp) => values.iter().any(|value| regexp.is_match(value)),
        })
    }
}
