// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use regex::Regex;

/// Include/exclude patterns applied to rendered observation lines
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl Filter {
    /// A filter that lets every line through
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Compile the patterns; empty strings count as unset
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, regex::Error> {
        let compile = |pattern: Option<&str>| {
            pattern
                .filter(|p| !p.is_empty())
                .map(Regex::new)
                .transpose()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Patterns match anywhere in the line
    pub fn allows(&self, line: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |re| re.is_match(line));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(line));
        included && !excluded
    }
}
