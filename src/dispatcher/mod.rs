// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The TSE Dispatcher (spec §4.3): HTTP ingress, design-space enumeration,
//! dispatch to Level-1 tools, result correlation, summary/hypervolume
//! bookkeeping, and callback streaming.

pub mod bus;
pub mod callback;
pub mod correlation;
pub mod enumerate;
pub mod hypervolume;
pub mod run;
pub mod server;
pub mod state;
pub mod summary;

pub use bus::DispatcherBus;
pub use callback::CallbackClient;
pub use run::{Run, RunRegistry};
pub use server::{router, AppState};
pub use state::RunStatus;
