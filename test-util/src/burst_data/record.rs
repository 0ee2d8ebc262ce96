use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct CountRecord {
    pub bin_left: f64,
    pub bin_right: f64,
    pub counts_a: f64,
    pub counts_b: f64,
    pub counts_c: f64,
    pub counts_d: f64,
}

impl CountRecord {
    pub fn counts(&self) -> [f64; 4] {
        [self.counts_a, self.counts_b, self.counts_c, self.counts_d]
    }
}
