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

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::model::{
    error::{ErrorCode, GatewayError},
    exchange::ExchangeContext,
    route::RouteDefinition,
};
use crate::core::plugin::source::RouteSource;

use super::cache::RouteCache;
use super::compiler::{CompiledRoute, RouteCompiler};

/// RouteResolver 为请求解析匹配的路由
///
/// Routes are considered in ascending `order`, definition order breaking ties.
/// A route that fails to compile, or whose predicate fails to evaluate, is
/// logged and skipped; it never aborts resolution of the request.
pub struct RouteResolver {
    source: Arc<dyn RouteSource>,
    compiler: Arc<dyn RouteCompiler>,
    cache: Arc<RouteCache>,
    // 最近一次用于清理缓存的完整路由快照
    pruned: ArcSwapOption<Vec<RouteDefinition>>,
}

impl RouteResolver {
    pub fn new(source: Arc<dyn RouteSource>, compiler: Arc<dyn RouteCompiler>) -> Self {
        Self {
            source,
            compiler,
            cache: Arc::new(RouteCache::new()),
            pruned: ArcSwapOption::empty(),
        }
    }

    /// with_cache 与其他解析器共享同一个编译缓存
    ///
    /// Routes missing from this resolver's source are evicted from the shared
    /// cache whenever the source publishes a new complete snapshot.
    pub fn with_cache(mut self, cache: Arc<RouteCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<RouteCache> {
        &self.cache
    }

    /// resolve 返回按 order 排列的匹配路由流
    ///
    /// The stream is lazy: each candidate is compiled and evaluated only when
    /// the next item is polled, so dropping the stream after the first item
    /// leaves the remaining predicates unevaluated.
    pub fn resolve<'a>(&'a self, exchange: &'a ExchangeContext) -> BoxStream<'a, Arc<CompiledRoute>> {
        stream::once(self.candidates(exchange))
            .flat_map(stream::iter)
            .filter_map(move |definition| async move {
                let route = self.compiled(&definition)?;
                self.evaluate(&route, exchange).await.then_some(route)
            })
            .boxed()
    }

    /// resolve_first 请求分发使用的首个匹配
    pub async fn resolve_first(&self, exchange: &ExchangeContext) -> Option<Arc<CompiledRoute>> {
        self.resolve(exchange).next().await
    }

    /// resolve_all 枚举全部匹配路由，供管理接口使用
    pub async fn resolve_all(&self, exchange: &ExchangeContext) -> Vec<Arc<CompiledRoute>> {
        self.resolve(exchange).collect().await
    }

    /// resolve_first_with_cancel 请求被取消时丢弃正在进行的断言求值
    pub async fn resolve_first_with_cancel(
        &self,
        exchange: &ExchangeContext,
        token: &CancellationToken,
    ) -> Result<Option<Arc<CompiledRoute>>, GatewayError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(GatewayError::new(
                ErrorCode::ResolveCancelled,
                format!("route resolution for {} {} cancelled", exchange.method(), exchange.path()),
            )),
            route = self.resolve_first(exchange) => Ok(route),
        }
    }

    async fn candidates(&self, exchange: &ExchangeContext) -> Vec<RouteDefinition> {
        let definitions = match self.source.list_definitions(exchange).await {
            Ok(definitions) => definitions,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    "[polaris][gateway] fail to list route definitions for {}: {}",
                    exchange.path(),
                    err
                );
                return Vec::new();
            }
        };
        if self.source.lists_all_routes() {
            self.prune(&definitions);
        }

        let mut ordered: Vec<RouteDefinition> = definitions.iter().cloned().collect();
        ordered.sort_by_key(|definition| definition.order);

        let mut seen = HashSet::with_capacity(ordered.len());
        ordered.retain(|definition| {
            if seen.insert(definition.id.clone()) {
                return true;
            }
            tracing::warn!(
                route_id = %definition.id,
                "[polaris][gateway] duplicate route definition {} will be ignored",
                definition.id
            );
            false
        });
        ordered
    }

    /// prune 快照更换后淘汰已经不存在的路由
    fn prune(&self, snapshot: &Arc<Vec<RouteDefinition>>) {
        let last = self.pruned.load();
        if matches!(&*last, Some(last) if Arc::ptr_eq(last, snapshot)) {
            return;
        }
        self.pruned.store(Some(snapshot.clone()));

        let live: HashSet<&str> = snapshot.iter().map(|definition| definition.id.as_str()).collect();
        let removed = self.cache.retain_ids(&live);
        if removed > 0 {
            tracing::debug!(
                "[polaris][gateway] evicted {} compiled routes missing from the current snapshot",
                removed
            );
        }
    }

    fn compiled(&self, definition: &RouteDefinition) -> Option<Arc<CompiledRoute>> {
        match self.cache.get_or_compile(definition, self.compiler.as_ref()) {
            Ok(route) => Some(route),
            Err(err) => {
                tracing::warn!(
                    route_id = %definition.id,
                    error = %err,
                    "[polaris][gateway] route definition {} will be ignored, definition has invalid configs: {}",
                    definition.id,
                    err
                );
                None
            }
        }
    }

    async fn evaluate(&self, route: &CompiledRoute, exchange: &ExchangeContext) -> bool {
        match route.matches(exchange).await {
            Ok(true) => {
                tracing::debug!(
                    "[polaris][gateway] route {} matched {} {}",
                    route.id(),
                    exchange.method(),
                    exchange.path()
                );
                true
            }
            Ok(false) => false,
            Err(err) => {
                tracing::warn!(
                    route_id = %route.id(),
                    error = %err,
                    "[polaris][gateway] route {} treated as not matched, predicate evaluation error: {}",
                    route.id(),
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::core::model::error::EvaluationError;
    use crate::core::model::route::{ComponentArgs, PredicateSpec};
    use crate::core::plugin::filter::FilterRegistry;
    use crate::core::plugin::predicate::{AsyncPredicate, PredicateFactory, PredicateRegistry};
    use crate::core::route::compiler::DefaultRouteCompiler;
    use crate::core::route::predicate::PredicateCompiler;
    use crate::plugins::source::dynamic::DynamicRouteSource;
    use crate::plugins::source::host::HostRouteSource;
    use crate::plugins::source::static_source::StaticRouteSource;

    struct ProbePredicate {
        outcome: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl AsyncPredicate for ProbePredicate {
        fn name(&self) -> &str {
            "Probe"
        }

        async fn test(&self, _exchange: &ExchangeContext) -> Result<bool, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome.as_str() {
                "true" => Ok(true),
                "fail" => Err(EvaluationError::new("Probe", "allow-list unreachable".to_string())),
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    struct ProbeFactory {
        calls: Arc<AtomicUsize>,
    }

    impl PredicateFactory for ProbeFactory {
        fn name(&self) -> &str {
            "Probe"
        }

        fn shortcut_fields(&self) -> &[&'static str] {
            &["outcome"]
        }

        fn apply(&self, args: &ComponentArgs) -> Result<Arc<dyn AsyncPredicate>, GatewayError> {
            Ok(Arc::new(ProbePredicate {
                outcome: args.required("outcome")?.to_string(),
                calls: self.calls.clone(),
            }))
        }
    }

    struct BrokenSource;

    #[async_trait::async_trait]
    impl RouteSource for BrokenSource {
        async fn list_definitions(
            &self,
            _exchange: &ExchangeContext,
        ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError> {
            Err(GatewayError::new(
                ErrorCode::InternalError,
                "config center unavailable".to_string(),
            ))
        }
    }

    fn resolver_with(definitions: Vec<RouteDefinition>) -> (RouteResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PredicateRegistry::with_defaults();
        registry.register(Arc::new(ProbeFactory { calls: calls.clone() }));
        let compiler = DefaultRouteCompiler::new(
            PredicateCompiler::new(Arc::new(registry)),
            Arc::new(FilterRegistry::new()),
        );
        let resolver = RouteResolver::new(
            Arc::new(StaticRouteSource::new(definitions)),
            Arc::new(compiler),
        );
        (resolver, calls)
    }

    fn route(id: &str, order: i32, predicates: &[&str]) -> RouteDefinition {
        predicates.iter().fold(
            RouteDefinition::new(id, "lb://myservice").with_order(order),
            |definition, text| definition.with_predicate(PredicateSpec::parse(text).unwrap()),
        )
    }

    fn ids(routes: &[Arc<CompiledRoute>]) -> Vec<&str> {
        routes.iter().map(|r| r.id()).collect()
    }

    fn exchange(path: &'static str) -> ExchangeContext {
        ExchangeContext::new(http::Method::GET, http::Uri::from_static(path))
    }

    #[tokio::test]
    async fn test_single_route_without_predicates_matches_any_request() {
        let (resolver, _) = resolver_with(vec![route("only", 0, &[])]);
        for path in ["/", "/api/users", "/static/app.js?v=3"] {
            let matched = resolver.resolve_first(&exchange(path)).await.unwrap();
            assert_eq!(matched.id(), "only");
        }
    }

    #[tokio::test]
    async fn test_catch_all_with_higher_precedence_wins() {
        let (resolver, _) = resolver_with(vec![
            route("a", 5, &["Probe=false"]),
            route("b", 1, &[]),
        ]);
        let matched = resolver.resolve_first(&exchange("/x")).await.unwrap();
        assert_eq!(matched.id(), "b");
        assert_eq!(ids(&resolver.resolve_all(&exchange("/x")).await), vec!["b"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unregistered_predicate_only_excludes_its_route() {
        let (resolver, _) = resolver_with(vec![
            route("weighted", 0, &["Weight=group1,8"]),
            route("api", 1, &["Path=/api/**"]),
            route("fallback", 2, &[]),
        ]);
        let matched = resolver.resolve_all(&exchange("/api/users")).await;
        assert_eq!(ids(&matched), vec!["api", "fallback"]);
        assert!(logs_contain("route definition weighted will be ignored"));
        assert!(logs_contain("Weight"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_evaluation_error_is_treated_as_not_matched() {
        let (resolver, _) = resolver_with(vec![
            route("flaky", 0, &["Probe=fail"]),
            route("stable", 1, &["Probe=true"]),
        ]);
        let matched = resolver.resolve_first(&exchange("/")).await.unwrap();
        assert_eq!(matched.id(), "stable");
        assert!(logs_contain("route flaky treated as not matched"));
        assert!(logs_contain("allow-list unreachable"));
    }

    #[tokio::test]
    async fn test_equal_order_keeps_definition_order() {
        let (resolver, _) = resolver_with(vec![
            route("late", 3, &[]),
            route("first", 0, &[]),
            route("second", 0, &[]),
            route("third", 0, &["Path=/**"]),
        ]);
        let matched = resolver.resolve_all(&exchange("/a/b")).await;
        assert_eq!(ids(&matched), vec!["first", "second", "third", "late"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_duplicate_ids_keep_first_in_order() {
        let (resolver, _) = resolver_with(vec![
            route("dup", 2, &["Path=/second"]),
            route("dup", 1, &["Path=/first"]),
        ]);
        assert!(resolver.resolve_first(&exchange("/second")).await.is_none());
        let matched = resolver.resolve_first(&exchange("/first")).await.unwrap();
        assert_eq!(matched.order(), 1);
        assert!(logs_contain("duplicate route definition dup"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_source_failure_yields_no_routes() {
        let compiler = DefaultRouteCompiler::new(
            PredicateCompiler::new(Arc::new(PredicateRegistry::with_defaults())),
            Arc::new(FilterRegistry::new()),
        );
        let resolver = RouteResolver::new(Arc::new(BrokenSource), Arc::new(compiler));
        assert!(resolver.resolve_all(&exchange("/")).await.is_empty());
        assert!(logs_contain("config center unavailable"));
    }

    #[tokio::test]
    async fn test_first_match_leaves_later_predicates_unevaluated() {
        let (resolver, calls) = resolver_with(vec![
            route("hit", 0, &["Probe=true"]),
            route("never", 1, &["Probe=true"]),
            route("never_either", 2, &["Probe=hang"]),
        ]);
        let matched = resolver.resolve_first(&exchange("/")).await.unwrap();
        assert_eq!(matched.id(), "hit");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let all = resolver.resolve(&exchange("/")).take(2).collect::<Vec<_>>().await;
        assert_eq!(ids(&all), vec!["hit", "never"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_compiled_routes_are_cached_across_requests() {
        let (resolver, _) = resolver_with(vec![route("a", 0, &["Path=/a"]), route("b", 1, &[])]);
        for _ in 0..3 {
            resolver.resolve_all(&exchange("/a")).await;
        }
        assert_eq!(resolver.cache().len(), 2);
    }

    fn resolver_over(source: Arc<dyn RouteSource>) -> RouteResolver {
        let compiler = DefaultRouteCompiler::new(
            PredicateCompiler::new(Arc::new(PredicateRegistry::with_defaults())),
            Arc::new(FilterRegistry::new()),
        );
        RouteResolver::new(source, Arc::new(compiler))
    }

    #[tokio::test]
    async fn test_route_updates_replace_cached_routes() {
        let source = Arc::new(DynamicRouteSource::default());
        let resolver = resolver_over(source.clone());

        for order in 0..100 {
            source.update(vec![route("a", order, &["Path=/a"])]);
            let matched = resolver.resolve_all(&exchange("/a")).await;
            assert_eq!(matched[0].order(), order);
        }
        assert_eq!(resolver.cache().len(), 1);

        source.update(vec![route("b", 0, &[])]);
        assert_eq!(ids(&resolver.resolve_all(&exchange("/a")).await), vec!["b"]);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_reloading_definitions_without_id_keeps_cache_bounded() {
        let source = Arc::new(DynamicRouteSource::default());
        let resolver = resolver_over(source.clone());

        for _ in 0..50 {
            let definitions: Vec<RouteDefinition> =
                serde_yaml::from_str("- uri: lb://svc\n- uri: lb://other\n  order: 1").unwrap();
            source.update(definitions);
            assert_eq!(resolver.resolve_all(&exchange("/")).await.len(), 2);
        }
        assert_eq!(resolver.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_host_scoped_listing_keeps_other_hosts_cached() {
        let source = HostRouteSource::new(
            HashMap::from([("api.example.com".to_string(), vec![route("api", 0, &[])])]),
            vec![route("fallback", 0, &[])],
        );
        let resolver = resolver_over(Arc::new(source));

        for host in ["api.example.com", "www.example.com", "api.example.com"] {
            let req = http::Request::builder()
                .uri("/")
                .header(http::header::HOST, host)
                .body(())
                .unwrap();
            resolver.resolve_first(&ExchangeContext::from_request(&req)).await.unwrap();
        }
        assert_eq!(resolver.cache().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_discards_pending_evaluation() {
        let (resolver, calls) = resolver_with(vec![
            route("slow", 0, &["Probe=hang"]),
            route("fallback", 1, &[]),
        ]);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = resolver
            .resolve_first_with_cancel(&exchange("/"), &token)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::ResolveCancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 已取消的令牌不会再启动任何求值
        let err = resolver
            .resolve_first_with_cancel(&exchange("/"), &token)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::ResolveCancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncancelled_resolution_returns_match() {
        let (resolver, _) = resolver_with(vec![route("a", 0, &["Path=/a"])]);
        let token = CancellationToken::new();
        let matched = resolver
            .resolve_first_with_cancel(&exchange("/a"), &token)
            .await
            .unwrap();
        assert_eq!(matched.unwrap().id(), "a");
        assert!(resolver
            .resolve_first_with_cancel(&exchange("/b"), &token)
            .await
            .unwrap()
            .is_none());
    }
}
