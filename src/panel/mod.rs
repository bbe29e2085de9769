mod error;
mod frame_panel;

pub use error::DisplayError;
pub use frame_panel::FramePanel;

use crate::render::RasterPair;

/// A two-colour bistable display.
///
/// A refresh is `power_on`, `show_frame`, `sleep`; the panel is never left
/// powered between refreshes.
pub trait Panel {
    fn power_on(&mut self) -> Result<(), DisplayError>;
    fn show_frame(&mut self, frame: &RasterPair) -> Result<(), DisplayError>;
    fn sleep(&mut self) -> Result<(), DisplayError>;
    fn clear(&mut self) -> Result<(), DisplayError>;
    /// Cut power entirely, e.g. before the process exits.
    fn power_off(&mut self) -> Result<(), DisplayError>;

    fn refresh(&mut self, frame: &RasterPair) -> Result<(), DisplayError> {
        self.power_on()?;
        self.show_frame(frame)?;
        self.sleep()
    }
}
