use eframe::egui::Vec2;

/// Who governs a node's position right now.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Pin {
    /// Moved by the simulation.
    #[default]
    Free,
    /// Held at the given world position by the user.
    Pinned(Vec2),
}

impl Pin {
    pub fn fixed_position(self) -> Option<Vec2> {
        match self {
            Self::Free => None,
            Self::Pinned(position) => Some(position),
        }
    }

    pub fn is_pinned(self) -> bool {
        matches!(self, Self::Pinned(_))
    }
}

/// One bubble. `radius` and `position` are assigned by the pack layout;
/// afterwards only the simulation (or an active drag pin) moves it.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleNode {
    /// Unique within a batch.
    pub id: String,
    /// Display label and the key other rows reference through `from`.
    pub name: String,
    pub value: f64,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Index of the source row in the batch's record list.
    pub record: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub pin: Pin,
}

impl BubbleNode {
    pub fn contains(&self, world: Vec2) -> bool {
        (world - self.position).length_sq() <= self.radius * self.radius
    }
}
