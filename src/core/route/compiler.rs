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

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::model::{
    error::{CompilationError, CompilationErrorKind, EvaluationError, GatewayError},
    exchange::ExchangeContext,
    route::{ComponentArgs, FilterSpec, RouteDefinition, Upstream},
};
use crate::core::plugin::filter::{FilterChain, FilterRegistry, GatewayFilter};

use super::predicate::{PredicateCompiler, RoutePredicate};

/// CompiledRoute 编译后的可执行路由，构建后不可变，可被并发请求共享
pub struct CompiledRoute {
    definition: RouteDefinition,
    predicate: RoutePredicate,
    filters: FilterChain,
    upstream: Upstream,
}

impl CompiledRoute {
    pub fn new(
        definition: RouteDefinition,
        predicate: RoutePredicate,
        filters: FilterChain,
        upstream: Upstream,
    ) -> Self {
        Self {
            definition,
            predicate,
            filters,
            upstream,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn order(&self) -> i32 {
        self.definition.order
    }

    pub fn definition(&self) -> &RouteDefinition {
        &self.definition
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.definition.metadata
    }

    pub fn predicate(&self) -> &RoutePredicate {
        &self.predicate
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn is_load_balanced(&self) -> bool {
        self.upstream.is_load_balanced()
    }

    pub async fn matches(&self, exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
        self.predicate.test(exchange).await
    }
}

impl fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("id", &self.definition.id)
            .field("order", &self.definition.order)
            .field("upstream", &self.upstream.to_string())
            .field("predicate", &self.predicate)
            .field("filters", &self.filters)
            .finish()
    }
}

/// RouteCompiler 把路由定义编译成可执行路由
pub trait RouteCompiler: Send + Sync {
    fn compile(&self, definition: &RouteDefinition) -> Result<CompiledRoute, CompilationError>;
}

pub struct DefaultRouteCompiler {
    predicates: PredicateCompiler,
    filters: Arc<FilterRegistry>,
    default_filters: Vec<FilterSpec>,
}

impl DefaultRouteCompiler {
    pub fn new(predicates: PredicateCompiler, filters: Arc<FilterRegistry>) -> Self {
        Self {
            predicates,
            filters,
            default_filters: Vec::new(),
        }
    }

    /// with_default_filters 应用于每条路由的过滤器，排在路由自身过滤器之前
    pub fn with_default_filters(mut self, default_filters: Vec<FilterSpec>) -> Self {
        self.default_filters = default_filters;
        self
    }

    fn load_filters(
        &self,
        route_id: &str,
        specs: &[FilterSpec],
        filters: &mut Vec<Arc<dyn GatewayFilter>>,
    ) -> Result<(), CompilationError> {
        for spec in specs.iter() {
            let factory = self.filters.resolve(&spec.name).ok_or_else(|| {
                CompilationError::new(
                    route_id,
                    &spec.name,
                    CompilationErrorKind::UnknownFilter,
                    "filter factory is not registered".to_string(),
                )
            })?;
            let invalid_args = |err: GatewayError| {
                CompilationError::new(
                    route_id,
                    &spec.name,
                    CompilationErrorKind::InvalidFilterArgs,
                    err.message().to_string(),
                )
            };
            let args = ComponentArgs::bind(
                &spec.args,
                factory.shortcut_fields(),
                factory.shortcut_type(),
            )
            .map_err(invalid_args)?;
            filters.push(factory.apply(&args).map_err(invalid_args)?);
        }
        Ok(())
    }
}

impl RouteCompiler for DefaultRouteCompiler {
    fn compile(&self, definition: &RouteDefinition) -> Result<CompiledRoute, CompilationError> {
        let route_id = definition.id.as_str();
        let upstream = Upstream::parse(&definition.uri).map_err(|reason| {
            CompilationError::new(
                route_id,
                &definition.uri,
                CompilationErrorKind::InvalidUri,
                reason,
            )
        })?;

        let predicate = self.predicates.compile(route_id, &definition.predicates)?;

        let mut filters = Vec::with_capacity(self.default_filters.len() + definition.filters.len());
        self.load_filters(route_id, &self.default_filters, &mut filters)?;
        self.load_filters(route_id, &definition.filters, &mut filters)?;

        tracing::debug!(
            "[polaris][gateway] route definition {} compiled, upstream {}",
            route_id,
            upstream
        );
        Ok(CompiledRoute::new(
            definition.clone(),
            predicate,
            FilterChain::new(filters),
            upstream,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::route::PredicateSpec;
    use crate::core::plugin::filter::FilterFactory;
    use crate::core::plugin::predicate::PredicateRegistry;

    struct OrderedFilter {
        name: String,
        order: i32,
    }

    #[async_trait::async_trait]
    impl GatewayFilter for OrderedFilter {
        fn name(&self) -> &str {
            &self.name
        }

        fn order(&self) -> i32 {
            self.order
        }

        async fn filter(&self, _exchange: &mut ExchangeContext) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    /// Order=<label>,<precedence>
    struct OrderedFilterFactory;

    impl FilterFactory for OrderedFilterFactory {
        fn name(&self) -> &str {
            "Order"
        }

        fn shortcut_fields(&self) -> &[&'static str] {
            &["label", "order"]
        }

        fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn GatewayFilter>, GatewayError> {
            let order = args.required("order")?.parse::<i32>().map_err(|e| {
                GatewayError::invalid_argument(format!("order is not a number: {}", e))
            })?;
            Ok(Arc::new(OrderedFilter {
                name: args.required("label")?.to_string(),
                order,
            }))
        }
    }

    fn compiler() -> DefaultRouteCompiler {
        let mut filters = FilterRegistry::new();
        filters.register(Arc::new(OrderedFilterFactory));
        DefaultRouteCompiler::new(
            PredicateCompiler::new(Arc::new(PredicateRegistry::with_defaults())),
            Arc::new(filters),
        )
    }

    #[test]
    fn test_compile_load_balanced_route() {
        let def = RouteDefinition::new("a", "lb://myservice")
            .with_order(1)
            .with_predicate(PredicateSpec::parse("Cookie=mycookie,mycookievalue").unwrap());
        let route = compiler().compile(&def).unwrap();
        assert_eq!(route.id(), "a");
        assert_eq!(route.order(), 1);
        assert!(route.is_load_balanced());
        assert_eq!(route.upstream().service_name(), Some("myservice"));
        assert_eq!(route.predicate().len(), 1);
        assert_eq!(route.definition(), &def);
    }

    #[test]
    fn test_compile_literal_route() {
        let def = RouteDefinition::new("b", "https://example.org");
        let route = compiler().compile(&def).unwrap();
        assert!(!route.is_load_balanced());
        assert!(route.predicate().is_catch_all());
    }

    #[test]
    fn test_filters_sorted_stably_after_defaults() {
        let compiler = compiler().with_default_filters(vec![
            FilterSpec::parse("Order=default-late,5").unwrap(),
            FilterSpec::parse("Order=default-early,0").unwrap(),
        ]);
        let def = RouteDefinition::new("c", "https://example.org")
            .with_filter(FilterSpec::parse("Order=route-early,0").unwrap())
            .with_filter(FilterSpec::parse("Order=route-first,-1").unwrap())
            .with_filter(FilterSpec::parse("Order=route-late,5").unwrap());
        let route = compiler.compile(&def).unwrap();
        assert_eq!(
            route.filters().names(),
            vec!["route-first", "default-early", "route-early", "default-late", "route-late"]
        );
    }

    #[test]
    fn test_invalid_uri_is_compilation_error() {
        let def = RouteDefinition::new("d", "adadsf");
        let err = compiler().compile(&def).err().unwrap();
        assert_eq!(err.kind, CompilationErrorKind::InvalidUri);
        assert_eq!(err.name, "adadsf");
        assert_eq!(err.route_id, "d");

        let empty = RouteDefinition::new("e", "");
        assert_eq!(
            compiler().compile(&empty).err().unwrap().kind,
            CompilationErrorKind::InvalidUri
        );
    }

    #[test]
    fn test_unknown_and_invalid_filters() {
        let def = RouteDefinition::new("f", "https://example.org")
            .with_filter(FilterSpec::parse("StripPrefix=1").unwrap());
        let err = compiler().compile(&def).err().unwrap();
        assert_eq!(err.kind, CompilationErrorKind::UnknownFilter);
        assert_eq!(err.name, "StripPrefix");

        let def = RouteDefinition::new("g", "https://example.org")
            .with_filter(FilterSpec::parse("Order=x,notanumber").unwrap());
        let err = compiler().compile(&def).err().unwrap();
        assert_eq!(err.kind, CompilationErrorKind::InvalidFilterArgs);
    }

    #[test]
    fn test_unknown_predicate_fails_route() {
        let def = RouteDefinition::new("h", "https://example.org")
            .with_predicate(PredicateSpec::parse("Weight=group1,8").unwrap());
        let err = compiler().compile(&def).err().unwrap();
        assert_eq!(err.kind, CompilationErrorKind::UnknownPredicate);
        assert_eq!(err.name, "Weight");
    }
}
