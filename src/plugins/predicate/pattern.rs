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

use regex::Regex;

use crate::core::model::error::GatewayError;

/// full_match_regex 编译一个必须完整匹配的正则
pub(crate) fn full_match_regex(pattern: &str) -> Result<Regex, GatewayError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
        GatewayError::invalid_argument(format!("invalid regexp {}: {}", pattern, err))
    })
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    /// `*` or `{var}`: exactly one non-empty segment.
    Single,
    /// `**`: zero or more segments.
    Rest,
    /// A segment mixing literals with `*` or `{var}`, such as `*.js`.
    Partial(Regex),
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, GatewayError> {
        if raw == "**" {
            return Ok(Segment::Rest);
        }
        if raw == "*" || is_variable(raw) {
            return Ok(Segment::Single);
        }
        if !raw.contains('*') && !raw.contains('{') {
            return Ok(Segment::Literal(raw.to_string()));
        }

        let mut expr = String::from("^");
        let mut rest = raw;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('*') {
                expr.push_str(".*");
                rest = tail;
            } else if rest.starts_with('{') {
                let end = rest.find('}').ok_or_else(|| {
                    GatewayError::invalid_argument(format!("unclosed variable in pattern segment {}", raw))
                })?;
                expr.push_str(".+");
                rest = &rest[end + 1..];
            } else {
                let end = rest.find(&['*', '{'][..]).unwrap_or(rest.len());
                expr.push_str(&regex::escape(&rest[..end]));
                rest = &rest[end..];
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).map_err(|err| {
            GatewayError::invalid_argument(format!("invalid pattern segment {}: {}", raw, err))
        })?;
        Ok(Segment::Partial(regex))
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == value,
            Segment::Single => !value.is_empty(),
            Segment::Rest => true,
            Segment::Partial(regex) => regex.is_match(value),
        }
    }
}

fn is_variable(raw: &str) -> bool {
    raw.len() > 2 && raw.starts_with('{') && raw.ends_with('}') && !raw[1..raw.len() - 1].contains(&['{', '}'][..])
}

/// GlobPattern 以分隔符切分的通配模式，用于路径（`/`）和主机名（`.`）
#[derive(Debug, Clone)]
pub(crate) struct GlobPattern {
    raw: String,
    separator: char,
    segments: Vec<Segment>,
}

impl GlobPattern {
    pub(crate) fn parse(raw: &str, separator: char) -> Result<Self, GatewayError> {
        let segments = split(raw, separator)
            .into_iter()
            .map(Segment::parse)
            .collect::<Result<Vec<Segment>, GatewayError>>()?;
        Ok(Self {
            raw: raw.to_string(),
            separator,
            segments,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn matches(&self, value: &str) -> bool {
        let parts = split(value, self.separator);
        match_segments(&self.segments, &parts)
    }
}

fn split(value: &str, separator: char) -> Vec<&str> {
    let trimmed = value.strip_prefix(separator).unwrap_or(value);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(separator).collect()
}

/// match_segments 逐个模式段推进可达位置，`**` 不回溯，耗时为 O(模式段数 × 请求段数)
fn match_segments(pattern: &[Segment], parts: &[&str]) -> bool {
    // reachable[j]: 已处理的模式段恰好消费了前 j 个请求段
    let mut reachable = vec![false; parts.len() + 1];
    reachable[0] = true;
    for segment in pattern {
        let mut next = vec![false; parts.len() + 1];
        match segment {
            Segment::Rest => {
                let mut seen = false;
                for (slot, here) in next.iter_mut().zip(&reachable) {
                    seen |= *here;
                    *slot = seen;
                }
            }
            segment => {
                for (j, part) in parts.iter().enumerate() {
                    if reachable[j] && segment.matches(part) {
                        next[j + 1] = true;
                    }
                }
            }
        }
        if !next.contains(&true) {
            return false;
        }
        reachable = next;
    }
    reachable[parts.len()]
}
