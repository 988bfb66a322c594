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

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Deserialize;
use url::Url;

use super::error::GatewayError;

/// Scheme marking an upstream that is resolved through load balancing, e.g. `lb://myservice`.
pub static LB_SCHEME: &str = "lb";

/// Prefix of argument keys generated from the `Name=a,b` shortcut notation.
pub static GENERATED_KEY_PREFIX: &str = "_genkey_";

pub fn generated_key(index: usize) -> String {
    format!("{}{}", GENERATED_KEY_PREFIX, index)
}

/// RouteDefinition 路由的原始定义
///
/// Lower `order` is evaluated first; equal orders keep discovery order. A
/// definition loaded without an `id` gets one derived from its content, so
/// reloading the same definition yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawRouteDefinition")]
pub struct RouteDefinition {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub predicates: Vec<PredicateSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Hash, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRouteDefinition {
    #[serde(default)]
    id: Option<String>,
    uri: String,
    #[serde(default)]
    predicates: Vec<PredicateSpec>,
    #[serde(default)]
    filters: Vec<FilterSpec>,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl From<RawRouteDefinition> for RouteDefinition {
    fn from(raw: RawRouteDefinition) -> Self {
        let id = match &raw.id {
            Some(id) => id.clone(),
            None => {
                let mut hasher = DefaultHasher::new();
                raw.hash(&mut hasher);
                format!("route-{:016x}", hasher.finish())
            }
        };
        Self {
            id,
            uri: raw.uri,
            predicates: raw.predicates,
            filters: raw.filters,
            order: raw.order,
            metadata: raw.metadata,
        }
    }
}

impl RouteDefinition {
    pub fn new(id: &str, uri: &str) -> Self {
        Self {
            id: id.to_string(),
            uri: uri.to_string(),
            predicates: Vec::new(),
            filters: Vec::new(),
            order: 0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_predicate(mut self, predicate: PredicateSpec) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Shortcut(String),
    Full {
        name: String,
        #[serde(default)]
        args: BTreeMap<String, String>,
    },
}

/// parse_shortcut 解析 `Name=a,b,c` 形式的简写
fn parse_shortcut(text: &str) -> Result<(String, BTreeMap<String, String>), String> {
    let (name, raw_args) = match text.split_once('=') {
        Some((name, raw_args)) => (name.trim(), Some(raw_args)),
        None => (text.trim(), None),
    };
    if name.is_empty() {
        return Err(format!(
            "unable to parse definition text {:?}, must be of the form name=value",
            text
        ));
    }
    let mut args = BTreeMap::new();
    if let Some(raw_args) = raw_args {
        for (i, value) in raw_args.split(',').enumerate() {
            args.insert(generated_key(i), value.trim().to_string());
        }
    }
    Ok((name.to_string(), args))
}

/// PredicateSpec 路由断言定义：工厂名称 + 命名参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawSpec")]
pub struct PredicateSpec {
    pub name: String,
    pub args: BTreeMap<String, String>,
}

impl PredicateSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: &str) -> Self {
        self.args.insert(key.to_string(), value.to_string());
        self
    }

    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        let (name, args) = parse_shortcut(text).map_err(GatewayError::invalid_argument)?;
        Ok(Self { name, args })
    }
}

impl TryFrom<RawSpec> for PredicateSpec {
    type Error = String;

    fn try_from(raw: RawSpec) -> Result<Self, Self::Error> {
        let (name, args) = match raw {
            RawSpec::Shortcut(text) => parse_shortcut(&text)?,
            RawSpec::Full { name, args } => (name, args),
        };
        Ok(Self { name, args })
    }
}

/// FilterSpec 路由过滤器定义，结构与 PredicateSpec 一致
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawSpec")]
pub struct FilterSpec {
    pub name: String,
    pub args: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: &str) -> Self {
        self.args.insert(key.to_string(), value.to_string());
        self
    }

    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        let (name, args) = parse_shortcut(text).map_err(GatewayError::invalid_argument)?;
        Ok(Self { name, args })
    }
}

impl TryFrom<RawSpec> for FilterSpec {
    type Error = String;

    fn try_from(raw: RawSpec) -> Result<Self, Self::Error> {
        let (name, args) = match raw {
            RawSpec::Shortcut(text) => parse_shortcut(&text)?,
            RawSpec::Full { name, args } => (name, args),
        };
        Ok(Self { name, args })
    }
}

/// ShortcutType 简写参数绑定到工厂字段的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutType {
    /// i-th generated value binds to the i-th shortcut field.
    Default,
    /// All generated values are joined with `,` into the first shortcut field.
    GatherList,
}

/// ComponentArgs 已绑定的断言/过滤器参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentArgs {
    values: BTreeMap<String, String>,
}

impl ComponentArgs {
    pub fn bind(
        raw: &BTreeMap<String, String>,
        fields: &[&str],
        shortcut_type: ShortcutType,
    ) -> Result<Self, GatewayError> {
        let mut values = BTreeMap::new();
        let mut generated = Vec::new();
        for (key, value) in raw.iter() {
            match key
                .strip_prefix(GENERATED_KEY_PREFIX)
                .and_then(|index| index.parse::<usize>().ok())
            {
                Some(index) => generated.push((index, value)),
                None => {
                    values.insert(key.clone(), value.clone());
                }
            }
        }
        // BTreeMap 字典序会把 _genkey_10 排在 _genkey_2 之前
        generated.sort_by_key(|(index, _)| *index);

        if generated.is_empty() {
            return Ok(Self { values });
        }
        match shortcut_type {
            ShortcutType::GatherList => {
                let field = fields.first().ok_or_else(|| {
                    GatewayError::invalid_argument("shortcut arguments are not supported".to_string())
                })?;
                let joined = generated
                    .iter()
                    .map(|(_, value)| value.as_str())
                    .collect::<Vec<&str>>()
                    .join(",");
                values.insert(field.to_string(), joined);
            }
            ShortcutType::Default => {
                if generated.len() > fields.len() {
                    return Err(GatewayError::invalid_argument(format!(
                        "expected at most {} shortcut arguments {:?}, got {}",
                        fields.len(),
                        fields,
                        generated.len()
                    )));
                }
                for (i, (_, value)) in generated.into_iter().enumerate() {
                    values.insert(fields[i].to_string(), value.clone());
                }
            }
        }
        Ok(Self { values })
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, key: &str) -> Result<&str, GatewayError> {
        self.optional(key)
            .ok_or_else(|| GatewayError::invalid_argument(format!("missing required argument {}", key)))
    }

    /// list 逗号分隔的参数，忽略空项
    pub fn list(&self, key: &str) -> Result<Vec<String>, GatewayError> {
        let items: Vec<String> = self
            .required(key)?
            .split(',')
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(|item| item.to_string())
            .collect();
        if items.is_empty() {
            return Err(GatewayError::invalid_argument(format!(
                "argument {} must not be empty",
                key
            )));
        }
        Ok(items)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, GatewayError> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => v.parse::<bool>().map_err(|_| {
                GatewayError::invalid_argument(format!("argument {} is not a boolean: {}", key, v))
            }),
        }
    }
}

/// Upstream 路由的目标：负载均衡的逻辑服务名或字面地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
    LoadBalanced { service_name: String, uri: Url },
    Direct(Url),
}

impl Upstream {
    pub fn parse(uri: &str) -> Result<Self, String> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err("upstream uri must not be empty".to_string());
        }
        let parsed = Url::parse(uri).map_err(|e| e.to_string())?;
        if parsed.scheme() != LB_SCHEME {
            return Ok(Upstream::Direct(parsed));
        }
        match parsed.host_str() {
            Some(service_name) if !service_name.is_empty() => Ok(Upstream::LoadBalanced {
                service_name: service_name.to_string(),
                uri: parsed.clone(),
            }),
            _ => Err(format!("load balanced uri {} has no service name", uri)),
        }
    }

    pub fn is_load_balanced(&self) -> bool {
        matches!(self, Upstream::LoadBalanced { .. })
    }

    pub fn service_name(&self) -> Option<&str> {
        match self {
            Upstream::LoadBalanced { service_name, .. } => Some(service_name),
            Upstream::Direct(_) => None,
        }
    }

    pub fn uri(&self) -> &Url {
        match self {
            Upstream::LoadBalanced { uri, .. } => uri,
            Upstream::Direct(uri) => uri,
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shortcut_predicate() {
        let spec = PredicateSpec::parse("Cookie=mycookie,mycookievalue").unwrap();
        assert_eq!(spec.name, "Cookie");
        assert_eq!(spec.args.get("_genkey_0").unwrap(), "mycookie");
        assert_eq!(spec.args.get("_genkey_1").unwrap(), "mycookievalue");

        let bare = FilterSpec::parse("PreserveHostHeader").unwrap();
        assert_eq!(bare.name, "PreserveHostHeader");
        assert!(bare.args.is_empty());

        assert!(PredicateSpec::parse("=value").is_err());
    }

    #[test]
    fn test_deserialize_route_definition() {
        let yaml = r#"
id: cookie_route
uri: lb://myservice
order: 3
predicates:
  - Cookie=mycookie,mycookievalue
  - name: Header
    args:
      header: X-Request-Id
filters:
  - StripPrefix=1
metadata:
  team: edge
"#;
        let def: RouteDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "cookie_route");
        assert_eq!(def.order, 3);
        assert_eq!(def.predicates.len(), 2);
        assert_eq!(def.predicates[0], PredicateSpec::parse("Cookie=mycookie,mycookievalue").unwrap());
        assert_eq!(
            def.predicates[1],
            PredicateSpec::new("Header").arg("header", "X-Request-Id")
        );
        assert_eq!(def.filters[0].args.get("_genkey_0").unwrap(), "1");
        assert_eq!(def.metadata.get("team").unwrap(), "edge");
    }

    #[test]
    fn test_route_id_derived_from_content_when_absent() {
        let a: RouteDefinition = serde_yaml::from_str("uri: https://example.org").unwrap();
        let b: RouteDefinition = serde_yaml::from_str("uri: https://example.org").unwrap();
        let c: RouteDefinition = serde_yaml::from_str("uri: https://example.org\norder: 1").unwrap();
        assert!(a.id.starts_with("route-"));
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.order, 0);
        assert!(a.predicates.is_empty());
    }

    #[test]
    fn test_bind_shortcut_arguments() {
        let spec = PredicateSpec::parse("Cookie=mycookie,mycookievalue").unwrap();
        let args = ComponentArgs::bind(&spec.args, &["name", "regexp"], ShortcutType::Default).unwrap();
        assert_eq!(args.required("name").unwrap(), "mycookie");
        assert_eq!(args.required("regexp").unwrap(), "mycookievalue");

        let err = ComponentArgs::bind(&spec.args, &["name"], ShortcutType::Default);
        assert!(err.is_err());

        let hosts = PredicateSpec::parse("Host=a.example.com,**.example.org").unwrap();
        let args = ComponentArgs::bind(&hosts.args, &["patterns"], ShortcutType::GatherList).unwrap();
        assert_eq!(
            args.list("patterns").unwrap(),
            vec!["a.example.com".to_string(), "**.example.org".to_string()]
        );
    }

    #[test]
    fn test_bind_orders_generated_keys_numerically() {
        let values: Vec<String> = (0..12).map(|i| format!("v{}", i)).collect();
        let text = format!("Method={}", values.join(","));
        let spec = PredicateSpec::parse(&text).unwrap();
        let args = ComponentArgs::bind(&spec.args, &["methods"], ShortcutType::GatherList).unwrap();
        assert_eq!(args.list("methods").unwrap(), values);
    }

    #[test]
    fn test_parse_upstream() {
        let lb = Upstream::parse("lb://myservice").unwrap();
        assert!(lb.is_load_balanced());
        assert_eq!(lb.service_name(), Some("myservice"));

        let direct = Upstream::parse("https://example.org:8443/base").unwrap();
        assert!(!direct.is_load_balanced());
        assert_eq!(direct.uri().port(), Some(8443));

        assert!(Upstream::parse("").is_err());
        assert!(Upstream::parse("adadsf").is_err());
        assert!(Upstream::parse("lb://").is_err());
    }
}
