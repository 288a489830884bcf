// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Miscellaneous things.

use std::{
    thread,
    time::{Duration, Instant},
};

use console::Term;
use crossbeam_channel::{bounded, RecvTimeoutError};
use is_terminal::IsTerminal;

fn is_a_tty() -> bool {
    std::io::stdout().is_terminal() || std::io::stderr().is_terminal()
}

/// Run `func` on another thread. If it hasn't finished after a couple of
/// seconds, keep a line on stderr saying how long we've been waiting for it
/// (only when we're attached to a terminal).
pub(crate) fn expensive_op<F, R>(func: F, wait_message: &str) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    const INITIAL_WAIT_TIME: Duration = Duration::from_secs(2);
    const TICK: Duration = Duration::from_millis(250);

    let (tx, rx) = bounded(1);

    thread::scope(|s| {
        let handle = thread::Builder::new()
            .name("expensive op".to_string())
            .spawn_scoped(s, move || {
                // The receiver outlives this thread.
                let _ = tx.send(func());
            })
            .expect("OS can create threads");

        let term = is_a_tty().then(Term::stderr);
        let start = Instant::now();
        let mut printed_wait_line = false;
        let clear = |term: &Term, printed: bool| {
            if printed {
                let _ = term.clear_last_lines(1);
            }
        };

        loop {
            match rx.recv_timeout(TICK) {
                Ok(r) => {
                    if let Some(term) = term.as_ref() {
                        clear(term, printed_wait_line);
                    }
                    return r;
                }

                Err(RecvTimeoutError::Timeout) => {
                    let waited = start.elapsed();
                    if let Some(term) = term.as_ref().filter(|_| waited >= INITIAL_WAIT_TIME) {
                        clear(term, printed_wait_line);
                        let _ = term.write_line(&format!(
                            "{wait_message}: {:.2}s",
                            waited.as_secs_f64()
                        ));
                        printed_wait_line = true;
                    }
                }

                // The sender was dropped without a value, so the closure
                // panicked. Re-raise it here.
                Err(RecvTimeoutError::Disconnected) => match handle.join() {
                    Err(e) => std::panic::resume_unwind(e),
                    Ok(()) => unreachable!("a finished op always sends its result"),
                },
            }
        }
    })
}
