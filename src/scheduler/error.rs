use thiserror::Error;

use crate::panel::DisplayError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("panel failed {failures} consecutive refreshes: {source}")]
    Display {
        failures: u32,
        #[source]
        source: DisplayError,
    },
}
