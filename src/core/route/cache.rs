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

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::model::{error::CompilationError, route::RouteDefinition};

use super::compiler::{CompiledRoute, RouteCompiler};

/// RouteCache 编译结果缓存，每个路由 id 只保留最新内容对应的编译结果
///
/// Backed by a sharded concurrent map: inserting a recompiled route only locks
/// its own shard, readers of other entries are not blocked.
#[derive(Default)]
pub struct RouteCache {
    entries: DashMap<String, Arc<CompiledRoute>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// get_or_compile 内容未变时返回同一个实例；内容变化则重新编译并原地替换
    ///
    /// Failed compilations are not cached and leave the previous entry in place.
    pub fn get_or_compile(
        &self,
        definition: &RouteDefinition,
        compiler: &dyn RouteCompiler,
    ) -> Result<Arc<CompiledRoute>, CompilationError> {
        if let Some(cached) = self.entries.get(&definition.id) {
            if cached.definition() == definition {
                return Ok(cached.clone());
            }
        }

        let compiled = Arc::new(compiler.compile(definition)?);
        let route = match self.entries.entry(definition.id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().definition() == definition {
                    // 并发编译时以先插入者为准
                    entry.get().clone()
                } else {
                    entry.insert(compiled.clone());
                    compiled
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(compiled.clone());
                compiled
            }
        };
        Ok(route)
    }

    /// retain_ids 删除不在 `live` 中的路由，返回删除的条目数
    pub fn retain_ids(&self, live: &HashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id.as_str()));
        before.saturating_sub(self.entries.len())
    }

    pub fn invalidate(&self, route_id: &str) {
        self.entries.remove(route_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
