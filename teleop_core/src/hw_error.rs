//! Maps `Box<dyn Error>` from trait boundaries to typed `TeleopError`.
//!
//! The traits in `teleop_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `teleop_hardware::HwError` downcasting.

use crate::error::TeleopError;

/// Which seam the error came from; decides the fallback variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seam {
    Robot,
    Terminal,
    Input,
}

/// Map a trait-boundary error to a typed `TeleopError`.
///
/// Known hardware error types are downcast first; anything else is filed
/// under the seam it crossed.
pub fn map_hw_error(seam: Seam, e: &(dyn std::error::Error + 'static)) -> TeleopError {
    #[cfg(feature = "hardware-errors")]
    {
        use teleop_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Robot(m) => TeleopError::Robot(m.clone()),
                HwError::Terminal(m) => TeleopError::Terminal(m.clone()),
                HwError::Unavailable(m) => TeleopError::Input(m.clone()),
                HwError::Io(io) => match seam {
                    Seam::Robot => TeleopError::Robot(io.to_string()),
                    Seam::Terminal => TeleopError::Terminal(io.to_string()),
                    Seam::Input => TeleopError::Input(io.to_string()),
                },
            };
        }
    }

    let s = e.to_string();
    match seam {
        Seam::Robot => TeleopError::Robot(s),
        Seam::Terminal => TeleopError::Terminal(s),
        Seam::Input => TeleopError::Input(s),
    }
}
