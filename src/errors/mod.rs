// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dispatcher;
mod runtime;
mod synth;

pub use dispatcher::DispatchError;
pub use runtime::RuntimeError;
pub use synth::InfeasibleError;
