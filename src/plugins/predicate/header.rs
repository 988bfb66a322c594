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

use http::header::HeaderName;
use regex::Regex;

use crate::core::model::{
    error::{EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::ComponentArgs,
};
use crate::core::plugin::predicate::{AsyncPredicate, PredicateFactory};

use super::pattern::full_match_regex;

pub const PREDICATE_HEADER: &str = "Header";

/// HeaderPredicateFactory `Header=name[,regexp]`
pub struct HeaderPredicateFactory {}

impl PredicateFactory for HeaderPredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_HEADER
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["header", "regexp"]
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        let raw = args.required("header")?;
        let header = HeaderName::from_bytes(raw.as_bytes()).map_err(|err| {
            GatewayError::invalid_argument(format!("invalid header name {}: {}", raw, err))
        })?;
        let regexp = args.optional("regexp").map(full_match_regex).transpose()?;
        Ok(Arc::new(HeaderPredicate { header, regexp }))
    }
}

struct HeaderPredicate {
    header: HeaderName,
    regexp: Option<Regex>,
}

#[async_trait::async_trait]
impl AsyncPredicate for HeaderPredicate {
    fn name(&self) -> &str {
        PREDICATE_HEADER
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        let mut values = exchange.headers().get_all(&self.header).iter().peekable();
        let Some(regexp) = &self.regexp else {
            return Ok(values.peek().is_some());
        };
        Ok(values
            .filter_map(|value| value.to_str().ok())
            .any(|value| regexp.is_match(value)))
    }
}
