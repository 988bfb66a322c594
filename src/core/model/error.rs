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

use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success = 0,
    ApiInvalidArgument = 1001,
    InvalidConfig = 1002,
    PluginError = 1003,
    ApiTimeout = 1004,
    InvalidState = 1005,
    InstanceNotFound = 1010,
    InvalidRule = 1011,
    RouteRuleNotMatch = 1012,
    InternalError = 1014,
    ServiceNotFound = 1015,
    RouteCompileError = 1021,
    PredicateEvalError = 1022,
    NoInstancesAvailable = 1023,
    ResolveCancelled = 1024,
    FilterError = 1025,
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::InternalError
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as i32)
    }
}

/// GatewayError 网关路由核心对外暴露的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    err_msg: String,
    err_code: ErrorCode,
    service: Option<String>,
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.err_code, self.err_msg)
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    pub fn new(code: ErrorCode, err_msg: String) -> Self {
        GatewayError {
            err_msg,
            err_code: code,
            service: None,
        }
    }

    /// no_instances 动态注册中心与静态配置均没有可用实例
    pub fn no_instances(service_name: &str) -> Self {
        GatewayError {
            err_msg: format!("no instances available for service {}", service_name),
            err_code: ErrorCode::NoInstancesAvailable,
            service: Some(service_name.to_string()),
        }
    }

    pub fn invalid_argument(err_msg: String) -> Self {
        Self::new(ErrorCode::ApiInvalidArgument, err_msg)
    }

    pub fn code(&self) -> ErrorCode {
        self.err_code
    }

    pub fn message(&self) -> &str {
        &self.err_msg
    }

    /// service returns the logical service name for `NoInstancesAvailable` errors.
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilationErrorKind {
    UnknownPredicate,
    UnknownFilter,
    InvalidPredicateArgs,
    InvalidFilterArgs,
    InvalidUri,
}

/// CompilationError 路由定义无法编译为可执行路由
///
/// `name` is the identifier that failed: the predicate or filter name, or the
/// upstream URI text for `InvalidUri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationError {
    pub route_id: String,
    pub name: String,
    pub kind: CompilationErrorKind,
    pub reason: String,
}

impl CompilationError {
    pub fn new(route_id: &str, name: &str, kind: CompilationErrorKind, reason: String) -> Self {
        Self {
            route_id: route_id.to_string(),
            name: name.to_string(),
            kind,
            reason,
        }
    }
}

impl Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            CompilationErrorKind::UnknownPredicate => write!(
                f,
                "route {}: unable to find predicate factory with name {}",
                self.route_id, self.name
            ),
            CompilationErrorKind::UnknownFilter => write!(
                f,
                "route {}: unable to find filter factory with name {}",
                self.route_id, self.name
            ),
            CompilationErrorKind::InvalidPredicateArgs => write!(
                f,
                "route {}: invalid arguments for predicate {}: {}",
                self.route_id, self.name, self.reason
            ),
            CompilationErrorKind::InvalidFilterArgs => write!(
                f,
                "route {}: invalid arguments for filter {}: {}",
                self.route_id, self.name, self.reason
            ),
            CompilationErrorKind::InvalidUri => write!(
                f,
                "route {}: invalid upstream uri {:?}: {}",
                self.route_id, self.name, self.reason
            ),
        }
    }
}

impl std::error::Error for CompilationError {}

impl From<CompilationError> for GatewayError {
    fn from(err: CompilationError) -> Self {
        GatewayError::new(ErrorCode::RouteCompileError, err.to_string())
    }
}

/// EvaluationError 断言在运行期执行失败（区别于返回 false）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationError {
    pub predicate: String,
    pub reason: String,
}

impl EvaluationError {
    pub fn new(predicate: &str, reason: String) -> Self {
        Self {
            predicate: predicate.to_string(),
            reason,
        }
    }
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "predicate {} failed: {}", self.predicate, self.reason)
    }
}

impl std::error::Error for EvaluationError {}

impl From<EvaluationError> for GatewayError {
    fn from(err: EvaluationError) -> Self {
        GatewayError::new(ErrorCode::PredicateEvalError, err.to_string())
    }
}
