/// Identity similarity weights.
///
/// Name carries the continuous similarity signal; email and phone are exact
/// comparisons and only participate when both sides carry the field. Absent
/// fields have their weight redistributed proportionally at scoring time, so
/// the constants only fix relative importance.
pub const IDENTITY_WEIGHTS: FieldWeights = FieldWeights {
    name: 0.5,
    email: 0.3,
    phone: 0.2,
};

#[derive(Debug, Clone, Copy)]
pub struct FieldWeights {
    pub name: f64,
    pub email: f64,
    pub phone: f64,
}

impl FieldWeights {
    pub fn sum(&self) -> f64 {
        self.name + self.email + self.phone
    }
}
