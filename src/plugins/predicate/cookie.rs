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

pub const PREDICATE_COOKIE: &str = "Cookie";

/// CookiePredicateFactory `Cookie=name,regexp`：存在名为 name 且值完整匹配 regexp 的 cookie
pub struct CookiePredicateFactory {}

impl PredicateFactory for CookiePredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_COOKIE
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["name", "regexp"]
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        let name = args.required("name")?.to_string();
        // `value` 是 `regexp` 的别名
        let regexp = match args.optional("regexp").or_else(|| args.optional("value")) {
            Some(regexp) => regexp,
            None => args.required("regexp")?,
        };
        Ok(Arc::new(CookiePredicate {
            name,
            regexp: full_match_regex(regexp)?,
        }))
    }
}

struct CookiePredicate {
    name: String,
    regexp: Regex,
}

#[async_trait::async_trait]
impl AsyncPredicate for CookiePredicate {
    fn name(&self) -> &str {
        PREDICATE_COOKIE
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        Ok(exchange
            .cookie_values(&self.name)
            .iter()
            .any(|value| self.regexp.is_match(value)))
    }
}
