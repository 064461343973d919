//! One pass of the compress action.
//!
//! Select the ore hold, select all, open the context menu and click the
//! compress entry. The entry is confirmed with OCR first; a missing entry
//! either means the hold is empty (dismiss the menu) or, with the laser
//! already stopped, that the trip is over.

use crate::automation::config::AutomationConfig;
use crate::automation::monitor::MiningState;
use crate::automation::session::Session;
use crate::error::InputError;
use crate::platform::KeyCommand;

/// How an action cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The menu entry was clicked.
    Compressed,
    /// No entry; the menu was closed by clicking the rest area.
    Dismissed,
    /// No entry and mining has stopped; the controller should shut down.
    Escalate,
}

/// Runs one action cycle. Any input failure aborts it.
pub fn run_action_cycle(
    session: &mut Session<'_>,
    config: &AutomationConfig,
    mining: MiningState,
) -> Result<CycleOutcome, InputError> {
    let tuning = &config.tuning;

    session.status().info("Moving to selection box");
    let target = session.random_point_in(config.selection_box);
    session.move_to(target)?;
    session.pause();
    session.click_primary()?;
    session.pause();

    session.status().info("Selecting all");
    session.send_keys(KeyCommand::SelectAll)?;
    session.pause();

    session.status().info("Right clicking");
    let anchor = session.cursor_position()?;
    session.click_secondary()?;
    session.pause();

    let Some(menu_item) = tuning.menu_item.item_region(anchor) else {
        return Err(InputError::Rejected(format!(
            "no menu item region at {}",
            anchor
        )));
    };

    if tuning.ocr.enabled {
        let visible =
            session
                .gate(tuning.ocr)
                .is_label_visible(menu_item, &tuning.menu_label, session.status());
        if !visible {
            if mining == MiningState::Stopped {
                session
                    .status()
                    .warn("Compress option not found - initiating shutdown");
                return Ok(CycleOutcome::Escalate);
            }
            session.status().info("Skipping compress - no ore");
            park(session, config)?;
            session.click_primary()?;
            return Ok(CycleOutcome::Dismissed);
        }
    }

    session.status().info("Moving to context menu");
    let target = session.random_point_in(menu_item);
    session.move_to(target)?;
    session.pause();
    session.click_primary()?;
    session.pause();

    park(session, config)?;
    Ok(CycleOutcome::Compressed)
}

/// Moves the cursor somewhere in the rest area.
fn park(session: &mut Session<'_>, config: &AutomationConfig) -> Result<(), InputError> {
    let target = session.random_point_in(config.rest_area);
    session.move_to(target)
}
