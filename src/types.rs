use geo::Point;

/// One geo-tagged observation: how many payments and evasions happened here.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub longitude: f64,
    pub latitude: f64,
    pub pagos: u64,
    pub evasiones: u64,
    // Heatmap weight as provided by the dataset, if any.
    pub count: Option<f64>,
}

impl Record {
    pub fn new(longitude: f64, latitude: f64, pagos: u64, evasiones: u64) -> Self {
        Self {
            longitude,
            latitude,
            pagos,
            evasiones,
            count: None,
        }
    }

    pub fn with_count(mut self, count: f64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    pub fn position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn total(&self) -> u64 {
        self.pagos.saturating_add(self.evasiones)
    }

    /// Heatmap weight: the dataset's `count` when present, otherwise `pagos + evasiones`.
    pub fn count_or_total(&self) -> f64 {
        self.count.unwrap_or(self.total() as f64)
    }

    /// Fraction of events that are evasions, `None` when there are no events at all.
    pub fn evasion_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some((self.evasiones as f64 / total as f64).clamp(0.0, 1.0)),
        }
    }

    /// Percentage of payments rounded to one decimal, `None` when there are no events.
    pub fn payment_percent(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some((1000.0 * self.pagos as f64 / total as f64).round() / 10.0),
        }
    }

    /// Payment percentage as shown to users: `"80.0"`, or `"N/A"` for an empty point.
    pub fn payment_percent_label(&self) -> String {
        match self.payment_percent() {
            Some(percent) => format!("{:.1}", percent),
            None => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Heatmap,
    Points,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Heatmap => ViewMode::Points,
            ViewMode::Points => ViewMode::Heatmap,
        }
    }
}

/// The record whose tooltip is open, with the screen position captured at click time.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub record: Record,
    pub screen_x: f64,
    pub screen_y: f64,
}
