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

use crate::core::model::naming::ServiceInstance;

/// InstanceRegistry 服务发现子系统维护的实例快照
pub trait InstanceRegistry: Send + Sync {
    /// snapshot returns the instances of `service_name`, empty on a miss.
    fn snapshot(&self, service_name: &str) -> Arc<Vec<ServiceInstance>>;
}

/// StaticInstanceSupplier 启动时加载的静态实例配置
pub trait StaticInstanceSupplier: Send + Sync {
    fn configured_instances(&self, service_name: &str) -> Arc<Vec<ServiceInstance>>;
}
