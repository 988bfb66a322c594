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

pub const PREDICATE_PATH: &str = "Path";

/// PathPredicateFactory `Path=/api/**,/v2/{segment}[,false]`
///
/// In shortcut form a trailing boolean is taken as `matchTrailingSlash`.
pub struct PathPredicateFactory {}

impl PredicateFactory for PathPredicateFactory {
    fn name(&self) -> &str {
        PREDICATE_PATH
    }

    fn shortcut_fields(&self) -> &[&'static str] {
        &["patterns", "matchTrailingSlash"]
    }

    fn shortcut_type(&self) -> ShortcutType {
        ShortcutType::GatherList
    }

    fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
        let mut raw = args.list("patterns")?;
        let mut match_trailing_slash = args.bool_or("matchTrailingSlash", true)?;
        if raw.len() > 1 {
            if let Some(flag) = raw.last().and_then(|last| last.parse::<bool>().ok()) {
                match_trailing_slash = flag;
                raw.pop();
            }
        }
        let patterns = raw
            .iter()
            .map(|pattern| GlobPattern::parse(pattern, '/'))
            .collect::<Result<Vec<GlobPattern>, GatewayError>>()?;
        Ok(Arc::new(PathPredicate {
            patterns,
            match_trailing_slash,
        }))
    }
}

struct PathPredicate {
    patterns: Vec<GlobPattern>,
    match_trailing_slash: bool,
}

#[async_trait::async_trait]
impl AsyncPredicate for PathPredicate {
    fn name(&self) -> &str {
        PREDICATE_PATH
    }

    async fn test(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        let path = exchange.path();
        let matched = self.patterns.iter().find(|pattern| {
            if pattern.matches(path) {
                return true;
            }
            match path.strip_suffix('/') {
                Some(trimmed) if self.match_trailing_slash && !trimmed.is_empty() => {
                    pattern.matches(trimmed)
                }
                _ => false,
            }
        });
        if let Some(pattern) = matched {
            tracing::trace!(
                "[polaris][gateway] path {} matched pattern {}",
                path,
                pattern.as_str()
            );
        }
        Ok(matched.is_some())
    }
}
