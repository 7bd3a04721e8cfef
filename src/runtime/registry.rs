// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `FunctionRegistry` — generalizes the teacher's `config::ProcessorMap`
//! (`HashMap<String, Arc<dyn Processor>>`) from processors to functions.

use std::collections::HashMap;
use std::sync::Arc;

use super::function::Function;

#[derive(Clone, Default)]
pub struct FunctionRegistry(HashMap<String, Arc<dyn Function>>);

impl FunctionRegistry {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.0.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.0.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
