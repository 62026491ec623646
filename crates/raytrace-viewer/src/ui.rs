//! Read-only heads-up display.

use crate::{camera::CameraPose, dispatch::DispatchGrid, session::DisplayMode};

/// Everything the HUD shows for one frame.
#[derive(Debug, Clone, Copy)]
pub struct HudStats {
    pub display: DisplayMode,
    pub pose: CameraPose,
    pub grid: DispatchGrid,
    pub frame_ms: f32,
}

impl HudStats {
    pub fn lines(&self) -> [String; 4] {
        let p = self.pose.position;
        [
            format!(
                "{} view | {:.2} ms",
                self.display.label(),
                self.frame_ms
            ),
            format!("pos ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z),
            format!("yaw {:.1}°  pitch {:.1}°", self.pose.yaw_deg, self.pose.pitch_deg),
            format!(
                "trace {}x{} | groups {}x{} | mip {}",
                self.grid.render.0,
                self.grid.render.1,
                self.grid.groups.0,
                self.grid.groups.1,
                self.grid.mip_levels
            ),
        ]
    }
}

pub fn draw_hud(ctx: &egui::Context, stats: &HudStats) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_black_alpha(160))
                .inner_margin(6.0)
                .rounding(4.0)
                .show(ui, |ui| {
                    for line in stats.lines() {
                        ui.label(
                            egui::RichText::new(line)
                                .monospace()
                                .color(egui::Color32::LIGHT_GRAY),
                        );
                    }
                    ui.label(
                        egui::RichText::new("WASD/Space/Shift move · mouse look · F depth · Esc quit")
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ViewportConfig;
    use glam::Vec3;

    #[test]
    fn hud_reports_mode_and_grid() {
        let stats = HudStats {
            display: DisplayMode::Depth,
            pose: CameraPose {
                position: Vec3::new(1.0, 2.0, -3.5),
                yaw_deg: 90.0,
                pitch_deg: -10.0,
            },
            grid: DispatchGrid::new(&ViewportConfig::new(720, 720, 2, (32, 32)).unwrap()),
            frame_ms: 16.6,
        };

        let lines = stats.lines();
        assert!(lines[0].starts_with("depth view"));
        assert_eq!(lines[1], "pos (1.00, 2.00, -3.50)");
        assert_eq!(lines[3], "trace 1440x1440 | groups 45x45 | mip 1");
    }
}
