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

use std::time::Duration;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default = "default_logger_dir")]
    pub dir: String,
    #[serde(default = "default_logger_file")]
    pub file: String,
    #[serde(default = "default_logger_level")]
    pub level: String,
}

fn default_logger_dir() -> String {
    "./logs".to_string()
}

fn default_logger_file() -> String {
    "polaris-gateway.log".to_string()
}

fn default_logger_level() -> String {
    "info".to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            dir: default_logger_dir(),
            file: default_logger_file(),
            level: default_logger_level(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolverConfig {
    /// 单个断言的求值超时，未配置时不限制
    #[serde(default, with = "serde_duration_ext::option")]
    pub predicate_timeout: Option<Duration>,
}

/// serde_duration_ext 解析 `500ms`、`2s`、`1m` 形式的时长，纯数字按毫秒处理
pub mod serde_duration_ext {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Millis(u64),
        Text(String),
    }

    pub fn parse(text: &str) -> Result<Duration, String> {
        let text = text.trim();
        let (value, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
            Some(pos) => text.split_at(pos),
            None => (text, "ms"),
        };
        let value: u64 = value
            .parse()
            .map_err(|_| format!("invalid duration {:?}", text))?;
        match unit.trim() {
            "ms" => Ok(Duration::from_millis(value)),
            "s" => Ok(Duration::from_secs(value)),
            "m" => Ok(Duration::from_secs(value * 60)),
            other => Err(format!("unsupported duration unit {:?} in {:?}", other, text)),
        }
    }

    fn from_raw<E: serde::de::Error>(raw: RawDuration) -> Result<Duration, E> {
        match raw {
            RawDuration::Millis(millis) => Ok(Duration::from_millis(millis)),
            RawDuration::Text(text) => parse(&text).map_err(E::custom),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        from_raw(RawDuration::deserialize(deserializer)?)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<super::RawDuration>::deserialize(deserializer)? {
                Some(raw) => super::from_raw(raw).map(Some),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(serde_duration_ext::parse("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(serde_duration_ext::parse("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(serde_duration_ext::parse("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(serde_duration_ext::parse("40").unwrap(), Duration::from_millis(40));
        assert!(serde_duration_ext::parse("2h").is_err());
        assert!(serde_duration_ext::parse("ms").is_err());
    }

    #[test]
    fn test_resolver_config() {
        let config: ResolverConfig = serde_yaml::from_str("predicateTimeout: 2s").unwrap();
        assert_eq!(config.predicate_timeout, Some(Duration::from_secs(2)));

        let config: ResolverConfig = serde_yaml::from_str("predicateTimeout: 150").unwrap();
        assert_eq!(config.predicate_timeout, Some(Duration::from_millis(150)));

        let config: ResolverConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.predicate_timeout, None);
    }
}
