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

use crate::core::model::{
    error::{EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::{ComponentArgs, ShortcutType},
};
use crate::core::plugin::predicate::{AsyncPredicate, PredicateFactory};

use super::pattern::GlobPattern;

pub const PREDICATE_HOST: &str = "Host";

/// HostPredicateFactory `Host=**.example.com,api.example.org`，忽略端口与大小写
pub struct HostPredicateFactory {}

impl PredicateFactory for HostPredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_HOST
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["patterns"]
    }

    fn shortcut_type(&self) -> ShortcutType {
        ShortcutType::GatherList
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        let patterns = args
            .list("patterns")?
            .iter()
            .map(|pattern| GlobPattern::parse(&pattern.to_ascii_lowercase(), '.'))
            .collect::<Result<Vec<GlobPattern>, GatewayError>>()?;
        Ok(Arc::new(HostPredicate { patterns }))
    }
}

struct HostPredicate {
    patterns: Vec<GlobPattern>,
}

#[async_trait::async_trait]
impl AsyncPredicate for HostPredicate {
    fn name(&self) -> &str {
        PREDICATE_HOST
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        let Some(host) = exchange.host() else {
            return Ok(false);
        };
        Ok(self.patterns.iter().any(|pattern| pattern.matches(&host)))
    }
}
