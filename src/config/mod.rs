// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod settings;

pub use settings::{load, BusSettings, DispatcherSettings, EvaluatorSettings, FunctionSpec, SettingsError};
