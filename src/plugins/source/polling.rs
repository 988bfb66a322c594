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

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::model::{
    error::{ErrorCode, GatewayError},
    exchange::ExchangeContext,
    route::RouteDefinition,
};
use crate::core::plugin::source::{RouteDefinitionLoader, RouteSource};

/// Document layout read by [`FileRouteDefinitionLoader`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RouteDefinitionDocument {
    #[serde(default)]
    routes: Vec<RouteDefinition>,
}

/// FileRouteDefinitionLoader 从 YAML 文件读取 `routes` 列表
pub struct FileRouteDefinitionLoader {
    path: PathBuf,
}

impl FileRouteDefinitionLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl RouteDefinitionLoader for FileRouteDefinitionLoader {
    async fn load(&self) -> Result<Vec<RouteDefinition>, GatewayError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            GatewayError::new(
                ErrorCode::InvalidConfig,
                format!("read route file {} fail: {}", self.path.display(), err),
            )
        })?;
        let document: RouteDefinitionDocument = serde_yaml::from_str(&content).map_err(|err| {
            GatewayError::new(
                ErrorCode::InvalidConfig,
                format!("parse route file {} fail: {}", self.path.display(), err),
            )
        })?;
        Ok(document.routes)
    }
}

/// PollingRouteSource 后台任务定时通过 loader 刷新路由
///
/// A failed reload keeps serving the previous snapshot.
pub struct PollingRouteSource {
    loader: Arc<dyn RouteDefinitionLoader>,
    definitions: Arc<ArcSwap<Vec<RouteDefinition>>>,
    closed: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingRouteSource {
    /// start 先同步加载一次，再启动定时刷新任务
    pub async fn start(loader: Arc<dyn RouteDefinitionLoader>, interval: Duration) -> Self {
        let definitions = Arc::new(ArcSwap::from_pointee(Vec::new()));
        reload(loader.as_ref(), &definitions).await;

        let closed = CancellationToken::new();
        let task = {
            let loader = loader.clone();
            let definitions = definitions.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = closed.cancelled() => {
                            tracing::info!("[polaris][gateway] route polling stopped");
                            return;
                        }
                        _ = tokio::time::sleep(interval) => {
                            reload(loader.as_ref(), &definitions).await;
                        }
                    }
                }
            }
            .instrument(tracing::Span::current()))
        };

        Self {
            loader,
            definitions,
            closed,
            task: Some(task),
        }
    }

    /// refresh 立即重新加载一次
    pub async fn refresh(&self) -> bool {
        reload(self.loader.as_ref(), &self.definitions).await
    }

    pub fn current(&self) -> Arc<Vec<RouteDefinition>> {
        self.definitions.load_full()
    }

    pub async fn stop(&mut self) {
        self.closed.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::error!("[polaris][gateway] route polling task exit abnormally: {}", err);
            }
        }
    }
}

impl Drop for PollingRouteSource {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

async fn reload(
    loader: &dyn RouteDefinitionLoader,
    definitions: &ArcSwap<Vec<RouteDefinition>>,
) -> bool {
    match loader.load().await {
        Ok(loaded) => {
            tracing::info!(
                "[polaris][gateway] route definitions reloaded, count: {}",
                loaded.len()
            );
            definitions.store(Arc::new(loaded));
            true
        }
        Err(err) => {
            tracing::error!(
                "[polaris][gateway] reload route definitions fail, keep previous {} routes: {}",
                definitions.load().len(),
                err
            );
            false
        }
    }
}

#[async_trait::async_trait]
impl RouteSource for PollingRouteSource {
    async fn list_definitions(
        &self,
        _exchange: &ExchangeContext,
    ) -> Result<Arc<Vec<RouteDefinition>>, GatewayError> {
        Ok(self.current())
    }
}
