use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Flat delivery rate for one Egyptian governorate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Governorate {
    pub id: i32,
    pub name: &'static str,
    cost: i64,
}

impl Governorate {
    const fn new(id: i32, name: &'static str, cost: i64) -> Self {
        Self { id, name, cost }
    }

    pub fn shipping_cost(&self) -> Decimal {
        Decimal::from(self.cost)
    }
}

pub const GOVERNORATES: [Governorate; 27] = [
    Governorate::new(1, "Cairo", 80),
    Governorate::new(2, "Giza", 80),
    Governorate::new(3, "Alexandria", 90),
    Governorate::new(4, "Qalyubia", 85),
    Governorate::new(5, "Sharqia", 95),
    Governorate::new(6, "Dakahlia", 95),
    Governorate::new(7, "Gharbia", 95),
    Governorate::new(8, "Monufia", 95),
    Governorate::new(9, "Beheira", 100),
    Governorate::new(10, "Kafr El Sheikh", 100),
    Governorate::new(11, "Damietta", 100),
    Governorate::new(12, "Port Said", 100),
    Governorate::new(13, "Ismailia", 100),
    Governorate::new(14, "Suez", 100),
    Governorate::new(15, "Faiyum", 105),
    Governorate::new(16, "Beni Suef", 110),
    Governorate::new(17, "Minya", 115),
    Governorate::new(18, "Asyut", 120),
    Governorate::new(19, "Sohag", 125),
    Governorate::new(20, "Qena", 130),
    Governorate::new(21, "Luxor", 130),
    Governorate::new(22, "Aswan", 140),
    Governorate::new(23, "Red Sea", 140),
    Governorate::new(24, "New Valley", 140),
    Governorate::new(25, "Matrouh", 140),
    Governorate::new(26, "North Sinai", 140),
    Governorate::new(27, "South Sinai", 140),
];

pub fn find_governorate(id: i32) -> Option<&'static Governorate> {
    GOVERNORATES.iter().find(|g| g.id == id)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GovernorateRate {
    pub id: i32,
    pub name: String,
    pub cost: Decimal,
}

impl From<&Governorate> for GovernorateRate {
    fn from(g: &Governorate) -> Self {
        Self {
            id: g.id,
            name: g.name.to_string(),
            cost: g.shipping_cost(),
        }
    }
}

pub fn governorate_rates() -> Vec<GovernorateRate> {
    GOVERNORATES.iter().map(GovernorateRate::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_and_names_are_unique() {
        let ids: HashSet<_> = GOVERNORATES.iter().map(|g| g.id).collect();
        let names: HashSet<_> = GOVERNORATES.iter().map(|g| g.name).collect();
        assert_eq!(ids.len(), GOVERNORATES.len());
        assert_eq!(names.len(), GOVERNORATES.len());
    }

    #[test]
    fn rates_stay_within_published_band() {
        for g in &GOVERNORATES {
            let cost = g.shipping_cost();
            assert!(cost >= Decimal::from(80) && cost <= Decimal::from(140), "{}", g.name);
        }
    }

    #[test]
    fn lookup_by_id() {
        let cairo = find_governorate(1).expect("cairo");
        assert_eq!(cairo.name, "Cairo");
        assert_eq!(cairo.shipping_cost(), Decimal::from(80));
        assert!(find_governorate(0).is_none());
        assert!(find_governorate(99).is_none());
    }
}
