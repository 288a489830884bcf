// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Job(E),

    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),
}

#[derive(Error, Debug)]
pub enum SignalHandlerError {
    #[error("Couldn't install the SIGINT/SIGTERM handler: {0}")]
    Ctrlc(#[from] ctrlc::Error),
}
