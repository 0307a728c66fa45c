// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The two periodic tasks of the pipeline.
//!
//! [`ScanScheduler`] and [`PublishScheduler`] run on independent periods and
//! share nothing but the [`AggregationBuffer`](crate::state::AggregationBuffer).
//! Each can be driven tick by tick (`run_cycle`, `publish_once`) or left to
//! run until shutdown (`run`).

mod publish;
mod scan;

pub use publish::{PublishOutcome, PublishScheduler};
pub use scan::{ScanCycle, ScanPhase, ScanScheduler};
