//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Availability, Priority, Status};

pub const GREEN: Color = Color::Rgb(76, 175, 80);
pub const BLUE: Color = Color::Rgb(33, 150, 243);
pub const ORANGE: Color = Color::Rgb(255, 152, 0);
pub const RED: Color = Color::Rgb(244, 67, 54);
/// Header and status bar background
pub const PALM_GREEN: Color = Color::Rgb(46, 125, 50);

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => GREEN,
        Status::InProgress => BLUE,
        Status::Pending => ORANGE,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => RED,
        Priority::Medium => ORANGE,
        Priority::Low => GREEN,
    }
}

pub fn availability_color(availability: Availability) -> Color {
    match availability {
        Availability::Available => GREEN,
        Availability::Busy => RED,
    }
}
