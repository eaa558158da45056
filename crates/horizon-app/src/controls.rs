//! Keyboard control of the sky panel.
//!
//! The panel has no on-screen widget; its state is written to the log when it
//! is shown and whenever a value changes.

use horizon_scene::{Renderer, SceneContext};
use horizon_sky::DebugPanel;
use tracing::{debug, info};

use crate::input::PanelCommand;

/// Apply a panel command. Returns `true` when a sky parameter changed (and
/// the scene was re-rendered). `ReloadConfig` is left to the caller.
pub fn apply_panel_command<R: Renderer>(
    panel: &mut DebugPanel,
    context: &mut SceneContext<R>,
    command: PanelCommand,
) -> bool {
    match command {
        PanelCommand::Toggle => {
            if panel.toggle() {
                info!("sky panel\n{}", panel.describe(context.sky_model().params()));
            } else {
                info!("sky panel hidden");
            }
            false
        }
        PanelCommand::SelectNext | PanelCommand::SelectPrevious if panel.is_visible() => {
            if command == PanelCommand::SelectNext {
                panel.select_next();
            } else {
                panel.select_previous();
            }
            info!(field = panel.selected().name(), "sky panel selection");
            false
        }
        PanelCommand::Nudge(steps) => {
            let Some((field, value)) = panel.nudge(context.sky_model_mut().params_mut(), steps)
            else {
                return false;
            };
            info!(field = field.name(), value, "sky parameter changed");
            context.apply_sky_parameters();
            true
        }
        PanelCommand::SelectNext | PanelCommand::SelectPrevious | PanelCommand::ReloadConfig => {
            debug!(?command, "panel command ignored");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_scene::{HeadlessRenderer, SceneAssembler, SceneSettings};
    use horizon_sky::SkyField;

    fn build() -> SceneContext<HeadlessRenderer> {
        SceneAssembler::build_scene(&SceneSettings::default(), HeadlessRenderer::new(), (800, 600))
    }

    #[test]
    fn test_hidden_panel_ignores_nudges() {
        let mut ctx = build();
        let mut panel = DebugPanel::sky_controls(false);
        let frames = ctx.renderer().frames_rendered();
        let before = *ctx.sky_model().params();

        assert!(!apply_panel_command(&mut panel, &mut ctx, PanelCommand::Nudge(5)));
        assert!(!apply_panel_command(&mut panel, &mut ctx, PanelCommand::SelectNext));
        assert_eq!(*ctx.sky_model().params(), before);
        assert_eq!(panel.selected(), SkyField::Turbidity);
        assert_eq!(ctx.renderer().frames_rendered(), frames);
    }

    #[test]
    fn test_nudge_updates_sky_and_renders() {
        let mut ctx = build();
        let mut panel = DebugPanel::sky_controls(true);
        while panel.selected() != SkyField::Elevation {
            apply_panel_command(&mut panel, &mut ctx, PanelCommand::SelectNext);
        }
        let frames = ctx.renderer().frames_rendered();

        assert!(apply_panel_command(&mut panel, &mut ctx, PanelCommand::Nudge(10)));
        assert!((ctx.sky_model().params().elevation - 11.3).abs() < 1e-4);
        assert_eq!(ctx.renderer().frames_rendered(), frames + 1);

        let expected = horizon_sky::sun_direction(ctx.sky_model().params().elevation, 153.4);
        let sky = ctx.scene().sky(ctx.handles().sky).unwrap();
        assert!((sky.uniforms.sun_position - expected).length() < 1e-5);
    }

    #[test]
    fn test_toggle_shows_and_hides() {
        let mut ctx = build();
        let mut panel = DebugPanel::sky_controls(false);
        apply_panel_command(&mut panel, &mut ctx, PanelCommand::Toggle);
        assert!(panel.is_visible());
        apply_panel_command(&mut panel, &mut ctx, PanelCommand::Toggle);
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_nudge_at_limit_is_no_change() {
        let mut ctx = build();
        let mut panel = DebugPanel::sky_controls(true);
        apply_panel_command(&mut panel, &mut ctx, PanelCommand::SelectPrevious);
        assert_eq!(panel.selected(), SkyField::Exposure);
        // Exposure starts at its maximum of 1.
        assert!(!apply_panel_command(&mut panel, &mut ctx, PanelCommand::Nudge(1)));
    }
}
